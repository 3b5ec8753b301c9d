use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use fund_api::{FundError, FundResult};
use fund_db::{models::IdempotencyRecordModel, repository::IdempotencyRepository};

/// Look up the idempotency registry. A hit with the same request hash
/// replays the stored result; a hit with a different hash is a `Conflict`.
pub(crate) async fn replay_idempotent<T: DeserializeOwned>(
    repository: &dyn IdempotencyRepository,
    fund_id: Uuid,
    endpoint: &str,
    idempotency_key: &str,
    request_hash: &str,
) -> FundResult<Option<T>> {
    match repository.find(fund_id, endpoint, idempotency_key).await? {
        None => Ok(None),
        Some(record) => {
            if record.request_hash.as_str() != request_hash {
                return Err(FundError::Conflict(format!(
                    "idempotency key {idempotency_key} reused with a different request body"
                )));
            }
            let result = serde_json::from_value(record.result_ref.clone()).map_err(|e| {
                FundError::Internal(format!("stored idempotency result unreadable: {e}"))
            })?;
            tracing::debug!(%fund_id, endpoint, idempotency_key, "idempotent replay");
            Ok(Some(result))
        }
    }
}

pub(crate) fn idempotency_record<T: Serialize>(
    fund_id: Uuid,
    endpoint: &str,
    idempotency_key: &str,
    request_hash: &HeaplessString<64>,
    result: &T,
    now: DateTime<Utc>,
) -> FundResult<IdempotencyRecordModel> {
    Ok(IdempotencyRecordModel {
        id: Uuid::new_v4(),
        fund_id,
        endpoint: HeaplessString::try_from(endpoint).map_err(|_| {
            FundError::Internal(format!("endpoint label too long: {endpoint}"))
        })?,
        idempotency_key: bounded_key(idempotency_key)?,
        request_hash: request_hash.clone(),
        result_ref: serde_json::to_value(result)
            .map_err(|e| FundError::Internal(format!("result serialisation failed: {e}")))?,
        created_at: now,
    })
}

/// Caller-supplied idempotency keys are capped at 64 characters.
pub(crate) fn bounded_key(key: &str) -> FundResult<HeaplessString<64>> {
    if key.is_empty() {
        return Err(FundError::validation("idempotency_key", "must not be empty"));
    }
    HeaplessString::try_from(key).map_err(|_| FundError::Validation {
        field: "idempotency_key".to_string(),
        message: "must not exceed 64 characters".to_string(),
    })
}
