pub mod audit_sink;
pub mod contribution_service;
pub mod dissolution_service;
pub mod event_publisher;
pub mod fund_service;
pub mod loan_service;
pub mod penalty_service;
pub mod repayment_service;
pub mod voting_service;

pub use audit_sink::*;
pub use contribution_service::*;
pub use dissolution_service::*;
pub use event_publisher::*;
pub use fund_service::*;
pub use loan_service::*;
pub use penalty_service::*;
pub use repayment_service::*;
pub use voting_service::*;
