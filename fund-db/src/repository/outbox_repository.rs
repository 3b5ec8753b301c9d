use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::OutboxEntryModel;

/// Outbox table for at-least-once event delivery across the commit
/// boundary. Entries are normally written by the composite repository
/// methods; `enqueue` covers operations with no other row to commit with.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    async fn enqueue(&self, entry: OutboxEntryModel) -> FundResult<OutboxEntryModel>;

    /// Unpublished entries due for (re)delivery, oldest first.
    async fn find_due(&self, now: DateTime<Utc>, limit: i64)
        -> FundResult<Vec<OutboxEntryModel>>;

    async fn mark_published(&self, entry_id: Uuid, published_at: DateTime<Utc>) -> FundResult<()>;

    /// Record a failed attempt and push the next one out.
    async fn reschedule(
        &self,
        entry_id: Uuid,
        attempts: i32,
        next_attempt_at: DateTime<Utc>,
    ) -> FundResult<()>;
}
