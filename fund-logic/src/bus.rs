use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use fund_api::{domain::EventEnvelope, service::EventPublisher, FundResult};

/// A consumer wired into the in-process bus (projections, notification
/// forwarding). Consumers are idempotent on `event_id`.
#[async_trait]
pub trait EventConsumer: Send + Sync {
    async fn on_event(&self, envelope: &EventEnvelope) -> FundResult<()>;
}

/// Single-binary event bus: fans each envelope out to registered consumers.
/// Any consumer failure fails the publish so the outbox retries the whole
/// envelope; consumers therefore dedupe on event id.
#[derive(Default)]
pub struct InProcessEventBus {
    consumers: RwLock<Vec<Arc<dyn EventConsumer>>>,
}

impl InProcessEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(&self, consumer: Arc<dyn EventConsumer>) {
        self.consumers.write().await.push(consumer);
    }
}

#[async_trait]
impl EventPublisher for InProcessEventBus {
    async fn publish(&self, envelope: &EventEnvelope) -> FundResult<()> {
        let consumers = self.consumers.read().await.clone();
        for consumer in consumers {
            consumer.on_event(envelope).await?;
        }
        tracing::debug!(
            event_id = %envelope.event_id,
            event_type = envelope.event.event_type(),
            fund_id = %envelope.fund_id,
            "event published"
        );
        Ok(())
    }
}
