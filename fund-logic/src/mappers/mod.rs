pub mod contribution_mapper;
pub mod fund_mapper;
pub mod loan_mapper;
pub mod membership_mapper;
pub mod repayment_mapper;
pub mod settlement_mapper;
pub mod voting_mapper;

pub use contribution_mapper::ContributionMapper;
pub use fund_mapper::FundMapper;
pub use loan_mapper::LoanMapper;
pub use membership_mapper::MembershipMapper;
pub use repayment_mapper::RepaymentMapper;
pub use settlement_mapper::SettlementMapper;
pub use voting_mapper::VotingMapper;
