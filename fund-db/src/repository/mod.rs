pub mod contribution_repository;
pub mod fund_repository;
pub mod idempotency_repository;
pub mod invitation_repository;
pub mod job_lock_repository;
pub mod loan_repository;
pub mod membership_repository;
pub mod outbox_repository;
pub mod repayment_repository;
pub mod settlement_repository;
pub mod transaction_repository;
pub mod voting_repository;

pub use contribution_repository::*;
pub use fund_repository::*;
pub use idempotency_repository::*;
pub use invitation_repository::*;
pub use job_lock_repository::*;
pub use loan_repository::*;
pub use membership_repository::*;
pub use outbox_repository::*;
pub use repayment_repository::*;
pub use settlement_repository::*;
pub use transaction_repository::*;
pub use voting_repository::*;
