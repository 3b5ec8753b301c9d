use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{LoanModel, OutboxEntryModel, TransactionModel};

#[async_trait]
pub trait LoanRepository: Send + Sync {
    async fn create(&self, loan: LoanModel, outbox: Vec<OutboxEntryModel>)
        -> FundResult<LoanModel>;

    /// Version-checked update. `loan.version` carries the expected version;
    /// persisted with `version + 1`. A mismatch yields `Conflict`.
    async fn update(&self, loan: LoanModel, outbox: Vec<OutboxEntryModel>)
        -> FundResult<LoanModel>;

    /// Approve + disburse in one transaction: version-checked loan update
    /// plus the Disbursement ledger append.
    async fn approve_and_disburse(
        &self,
        loan: LoanModel,
        disbursement: TransactionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel>;

    async fn find_by_id(&self, loan_id: Uuid) -> FundResult<Option<LoanModel>>;

    async fn find_by_borrower(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<Vec<LoanModel>>;

    /// Loans counted against `max_concurrent_loans`
    /// (PendingApproval, Approved, Active).
    async fn count_open_by_borrower(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<i64>;

    async fn find_open_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<LoanModel>>;
}
