use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{
    IdempotencyRecordModel, LoanModel, OutboxEntryModel, RepaymentEntryModel, TransactionModel,
};

#[async_trait]
pub trait RepaymentRepository: Send + Sync {
    async fn create(
        &self,
        entry: RepaymentEntryModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel>;

    async fn find_by_id(&self, entry_id: Uuid) -> FundResult<Option<RepaymentEntryModel>>;

    async fn find_by_loan_month(
        &self,
        loan_id: Uuid,
        month_year: i32,
    ) -> FundResult<Option<RepaymentEntryModel>>;

    async fn find_by_loan(&self, loan_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>>;

    /// Pending/Partial entries for the fund, the overdue sweep's input.
    async fn find_open_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>>;

    /// Entries currently Overdue with a positive remaining balance.
    async fn find_overdue_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>>;

    /// Version-checked update. `entry.version` carries the expected version;
    /// persisted with `version + 1`. A mismatch yields `Conflict`.
    async fn update(
        &self,
        entry: RepaymentEntryModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel>;

    /// Payment recording: version-checked entry and loan updates, the
    /// Repayment and InterestIncome ledger appends, the idempotency record
    /// and outbox entries, all in one transaction.
    async fn record_payment(
        &self,
        entry: RepaymentEntryModel,
        loan: LoanModel,
        cash_transaction: TransactionModel,
        interest_transaction: Option<TransactionModel>,
        idempotency: IdempotencyRecordModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel>;
}
