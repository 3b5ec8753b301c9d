use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Committed-but-unpublished event envelope. Rows are written inside the
/// same transaction as the state change they describe and deleted never;
/// `published_at` marks completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntryModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub event_id: Uuid,
    pub event_type: HeaplessString<50>,
    /// Serialised `EventEnvelope`.
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
