pub mod helpers;

pub mod contribution_repository_impl;
pub mod fund_repository_impl;
pub mod idempotency_repository_impl;
pub mod invitation_repository_impl;
pub mod job_lock_repository_impl;
pub mod loan_repository_impl;
pub mod membership_repository_impl;
pub mod outbox_repository_impl;
pub mod repayment_repository_impl;
pub mod settlement_repository_impl;
pub mod transaction_repository_impl;
pub mod voting_repository_impl;

pub use contribution_repository_impl::ContributionDueRepositoryImpl;
pub use fund_repository_impl::FundRepositoryImpl;
pub use idempotency_repository_impl::IdempotencyRepositoryImpl;
pub use invitation_repository_impl::InvitationRepositoryImpl;
pub use job_lock_repository_impl::JobLockRepositoryImpl;
pub use loan_repository_impl::LoanRepositoryImpl;
pub use membership_repository_impl::MembershipRepositoryImpl;
pub use outbox_repository_impl::OutboxRepositoryImpl;
pub use repayment_repository_impl::RepaymentRepositoryImpl;
pub use settlement_repository_impl::SettlementRepositoryImpl;
pub use transaction_repository_impl::TransactionRepositoryImpl;
pub use voting_repository_impl::VotingRepositoryImpl;
