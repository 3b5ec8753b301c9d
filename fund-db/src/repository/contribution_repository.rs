use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{
    ContributionDueModel, IdempotencyRecordModel, OutboxEntryModel, TransactionModel,
};

/// Monthly contribution dues.
#[async_trait]
pub trait ContributionDueRepository: Send + Sync {
    async fn create(&self, due: ContributionDueModel) -> FundResult<ContributionDueModel>;

    async fn exists(&self, fund_id: Uuid, user_id: Uuid, month_year: i32) -> FundResult<bool>;

    async fn find_by_id(&self, due_id: Uuid) -> FundResult<Option<ContributionDueModel>>;

    async fn find_by_fund_month(
        &self,
        fund_id: Uuid,
        month_year: i32,
    ) -> FundResult<Vec<ContributionDueModel>>;

    /// Dues that still owe: Pending, Partial or Late with a positive
    /// remaining balance.
    async fn find_unsettled_by_fund(&self, fund_id: Uuid)
        -> FundResult<Vec<ContributionDueModel>>;

    async fn find_unsettled_by_user(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Vec<ContributionDueModel>>;

    /// Version-checked update (overdue sweep). `due.version` carries the
    /// expected version; persisted with `version + 1`.
    async fn update(
        &self,
        due: ContributionDueModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<ContributionDueModel>;

    /// Payment recording: version-checked due update, ledger append,
    /// idempotency record and outbox entries in one transaction.
    async fn record_payment(
        &self,
        due: ContributionDueModel,
        transaction: TransactionModel,
        idempotency: IdempotencyRecordModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<ContributionDueModel>;
}
