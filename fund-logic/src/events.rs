use std::sync::Arc;

use chrono::Utc;
use heapless::String as HeaplessString;
use uuid::Uuid;

use fund_api::{
    domain::EventEnvelope, service::EventPublisher, FundError, FundResult,
};
use fund_db::{models::OutboxEntryModel, repository::OutboxRepository};

/// Stages domain events as outbox rows and publishes them after commit.
///
/// Composite repository methods persist the staged rows inside the same
/// transaction as the state change; `flush` then attempts immediate
/// delivery. Anything that fails stays in the outbox for the dispatcher.
#[derive(Clone)]
pub struct EventRecorder {
    outbox_repository: Arc<dyn OutboxRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl EventRecorder {
    pub fn new(
        outbox_repository: Arc<dyn OutboxRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            outbox_repository,
            publisher,
        }
    }

    /// Serialise an envelope into an outbox row ready to commit.
    pub fn stage(envelope: &EventEnvelope) -> FundResult<OutboxEntryModel> {
        let payload = serde_json::to_value(envelope)
            .map_err(|e| FundError::Internal(format!("event serialisation failed: {e}")))?;
        let event_type = HeaplessString::try_from(envelope.event.event_type())
            .map_err(|_| FundError::Internal("event type exceeds column width".to_string()))?;
        Ok(OutboxEntryModel {
            id: Uuid::new_v4(),
            fund_id: envelope.fund_id,
            event_id: envelope.event_id,
            event_type,
            payload,
            attempts: 0,
            next_attempt_at: envelope.occurred_at,
            published_at: None,
            created_at: envelope.occurred_at,
        })
    }

    /// Enqueue an envelope directly; used by operations whose own writes are
    /// individually idempotent and carry no composite transaction.
    pub async fn enqueue(&self, envelope: &EventEnvelope) -> FundResult<OutboxEntryModel> {
        let entry = Self::stage(envelope)?;
        self.outbox_repository.enqueue(entry.clone()).await?;
        Ok(entry)
    }

    /// Post-commit delivery attempt for already-committed outbox rows.
    /// Failures are left for the dispatcher; this never surfaces an error
    /// to the caller, whose state change has already committed.
    pub async fn flush(&self, entries: &[OutboxEntryModel]) {
        for entry in entries {
            let envelope: EventEnvelope = match serde_json::from_value(entry.payload.clone()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!(
                        outbox_id = %entry.id,
                        "unreadable outbox payload, leaving for dispatcher: {e}"
                    );
                    continue;
                }
            };
            match self.publisher.publish(&envelope).await {
                Ok(()) => {
                    if let Err(e) = self
                        .outbox_repository
                        .mark_published(entry.id, Utc::now())
                        .await
                    {
                        tracing::warn!(
                            outbox_id = %entry.id,
                            "published but could not mark outbox row: {e}"
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        outbox_id = %entry.id,
                        event_type = entry.event_type.as_str(),
                        "immediate publish failed, dispatcher will retry: {e}"
                    );
                }
            }
        }
    }
}

/// Blake3 fingerprint (hex) of a request body for the idempotency registry.
pub fn request_fingerprint(parts: &[&str]) -> HeaplessString<64> {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\x1f");
    }
    let hex = hasher.finalize().to_hex();
    // A blake3 hex digest is exactly 64 characters.
    HeaplessString::try_from(hex.as_str()).unwrap_or_default()
}
