use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::Serialize;
use uuid::Uuid;

use fund_api::{domain::AuditEnvelope, FundError, FundResult};

/// Service name stamped on every audit envelope emitted by this crate.
pub const SERVICE_NAME: &str = "fund-core";

/// Build the before/after audit envelope for a state-changing operation.
/// The payload hash covers both states so later tampering is detectable.
pub fn build_envelope<B: Serialize, A: Serialize>(
    actor_id: Uuid,
    fund_id: Option<Uuid>,
    entity_type: &str,
    entity_id: Uuid,
    action_type: &str,
    before_state: Option<&B>,
    after_state: Option<&A>,
    occurred_at: DateTime<Utc>,
) -> FundResult<AuditEnvelope> {
    let before = before_state
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| FundError::Internal(format!("audit serialisation failed: {e}")))?;
    let after = after_state
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| FundError::Internal(format!("audit serialisation failed: {e}")))?;

    let mut hasher = blake3::Hasher::new();
    if let Some(ref value) = before {
        hasher.update(value.to_string().as_bytes());
    }
    hasher.update(b"\x1f");
    if let Some(ref value) = after {
        hasher.update(value.to_string().as_bytes());
    }
    let hex = hasher.finalize().to_hex();

    Ok(AuditEnvelope {
        id: Uuid::new_v4(),
        actor_id,
        fund_id,
        entity_type: bounded_label("entity_type", entity_type)?,
        entity_id,
        action_type: bounded_label("action_type", action_type)?,
        before_state: before,
        after_state: after,
        correlation_id: None,
        service_name: bounded_label("service_name", SERVICE_NAME)?,
        details_hash: HeaplessString::try_from(hex.as_str()).unwrap_or_default(),
        occurred_at,
    })
}

fn bounded_label(field: &'static str, value: &str) -> FundResult<HeaplessString<50>> {
    HeaplessString::try_from(value).map_err(|_| FundError::Validation {
        field: field.to_string(),
        message: "label exceeds 50 characters".to_string(),
    })
}
