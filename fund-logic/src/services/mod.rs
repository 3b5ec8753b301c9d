pub mod contribution_service_impl;
pub mod dissolution_service_impl;
pub mod fund_service_impl;
pub mod loan_service_impl;
pub mod penalty_service_impl;
pub mod repayment_service_impl;
pub mod voting_service_impl;

mod support;

pub use contribution_service_impl::*;
pub use dissolution_service_impl::*;
pub use fund_service_impl::*;
pub use loan_service_impl::*;
pub use penalty_service_impl::*;
pub use repayment_service_impl::*;
pub use voting_service_impl::*;
