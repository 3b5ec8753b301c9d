use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{FundModel, OutboxEntryModel};

/// Persistence for the fund aggregate row.
///
/// Mutations take the staged outbox entries for the events they commit;
/// implementations persist rows and outbox in one transaction.
#[async_trait]
pub trait FundRepository: Send + Sync {
    async fn create(&self, fund: FundModel, outbox: Vec<OutboxEntryModel>)
        -> FundResult<FundModel>;

    /// Version-checked update. `fund.version` carries the expected version;
    /// the row is persisted with `version + 1`. A mismatch yields `Conflict`.
    async fn update(&self, fund: FundModel, outbox: Vec<OutboxEntryModel>)
        -> FundResult<FundModel>;

    async fn find_by_id(&self, fund_id: Uuid) -> FundResult<Option<FundModel>>;

    async fn exists(&self, fund_id: Uuid) -> FundResult<bool>;
}
