use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{
        ContributionDue, ContributionReceipt, DueGenerationReport, LedgerFilter, MonthYear,
        OverdueReport, Transaction,
    },
    FundResult,
};

/// Monthly dues, payment recording and the append-only ledger.
#[async_trait]
pub trait ContributionService: Send + Sync {
    /// Create one due per active member plan for the month. Idempotent on
    /// (fund, user, month): re-running skips existing rows.
    async fn generate_dues(
        &self,
        fund_id: Uuid,
        month_year: MonthYear,
    ) -> FundResult<DueGenerationReport>;

    /// Record a payment against a due. Protected by the idempotency
    /// registry and the due's row version.
    async fn record_payment(
        &self,
        request: RecordContributionRequest,
    ) -> FundResult<ContributionReceipt>;

    /// Mark Pending/Partial dues past `due_date + grace_period_days` Late,
    /// and stamp `missed_at` past the fund's missed threshold when set.
    async fn detect_overdue(&self, fund_id: Uuid, as_of: DateTime<Utc>)
        -> FundResult<OverdueReport>;

    async fn find_due_by_id(&self, due_id: Uuid) -> FundResult<Option<ContributionDue>>;

    async fn find_dues_for_month(
        &self,
        fund_id: Uuid,
        month_year: MonthYear,
    ) -> FundResult<Vec<ContributionDue>>;

    /// Ledger query by type, user and date range.
    async fn ledger_entries(
        &self,
        fund_id: Uuid,
        filter: LedgerFilter,
    ) -> FundResult<Vec<Transaction>>;

    /// Pool balance recomputed from the ledger.
    async fn fund_balance(&self, fund_id: Uuid) -> FundResult<Decimal>;

    /// Total interest income collected so far (the dissolution pool).
    async fn interest_pool(&self, fund_id: Uuid) -> FundResult<Decimal>;
}

#[derive(Debug, Clone, Validate)]
pub struct RecordContributionRequest {
    pub due_id: Uuid,
    pub amount: Decimal,
    #[validate(length(min = 1, max = 64))]
    pub idempotency_key: String,
    pub expected_version: i32,
    pub recorded_by: Uuid,
}
