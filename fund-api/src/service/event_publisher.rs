use async_trait::async_trait;

use crate::{domain::EventEnvelope, FundResult};

/// External event bus seam. Implementations may fan out in-process or hand
/// off to a broker; delivery is at-least-once via the outbox, so consumers
/// dedupe on `event_id`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, envelope: &EventEnvelope) -> FundResult<()>;
}
