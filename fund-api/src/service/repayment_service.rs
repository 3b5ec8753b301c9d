use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{MonthYear, RepaymentEntry, RepaymentReceipt},
    FundResult,
};

/// Monthly repayment entries with reducing-balance arithmetic and
/// interest-first payment allocation.
#[async_trait]
pub trait RepaymentService: Send + Sync {
    /// Generate the entry for (loan, month) from the loan's approval-time
    /// snapshots. Idempotent on the unique (loan_id, month_year) key: an
    /// existing entry is returned unchanged.
    async fn generate_entry(
        &self,
        loan_id: Uuid,
        month_year: MonthYear,
    ) -> FundResult<RepaymentEntry>;

    /// Record a payment. Splits the amount interest-first, reduces the
    /// loan's outstanding principal, appends Repayment and InterestIncome
    /// ledger entries, and auto-closes the loan at zero outstanding.
    async fn record_payment(
        &self,
        request: RecordRepaymentRequest,
    ) -> FundResult<RepaymentReceipt>;

    /// Mark Pending/Partial entries past their due date Overdue.
    /// Returns how many entries were marked.
    async fn mark_overdue(&self, fund_id: Uuid, as_of: NaiveDate) -> FundResult<u32>;

    async fn find_entry_by_id(&self, entry_id: Uuid) -> FundResult<Option<RepaymentEntry>>;

    async fn find_entries_by_loan(&self, loan_id: Uuid) -> FundResult<Vec<RepaymentEntry>>;
}

#[derive(Debug, Clone, Validate)]
pub struct RecordRepaymentRequest {
    pub entry_id: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 1, max = 64))]
    pub idempotency_key: String,
    pub expected_version: i32,
    pub recorded_by: Uuid,
}
