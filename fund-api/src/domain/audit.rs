use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Before/after envelope recorded for every state-changing operation.
/// The audit sink is append-only; one envelope per mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEnvelope {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub fund_id: Option<Uuid>,
    pub entity_type: HeaplessString<50>,
    pub entity_id: Uuid,
    pub action_type: HeaplessString<50>,
    pub before_state: Option<serde_json::Value>,
    pub after_state: Option<serde_json::Value>,
    pub correlation_id: Option<Uuid>,
    pub service_name: HeaplessString<50>,
    /// Blake3 hash (hex) over the before/after payload for tamper detection.
    pub details_hash: HeaplessString<64>,
    pub occurred_at: DateTime<Utc>,
}
