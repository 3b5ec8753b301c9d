use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use fund_api::{domain::EventEnvelope, service::EventPublisher, FundResult};
use fund_db::repository::OutboxRepository;

/// Periodic outbox drain: redelivers committed events whose immediate
/// publish failed. Retries are unbounded with exponential backoff and
/// jitter; consumers dedupe on event id (at-least-once).
pub struct OutboxDispatcher {
    outbox_repository: Arc<dyn OutboxRepository>,
    publisher: Arc<dyn EventPublisher>,
    base_delay_secs: i64,
    max_batch: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchReport {
    pub published: u32,
    pub rescheduled: u32,
}

impl OutboxDispatcher {
    pub fn new(
        outbox_repository: Arc<dyn OutboxRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            outbox_repository,
            publisher,
            base_delay_secs: 5,
            max_batch: 100,
        }
    }

    pub fn with_base_delay(mut self, base_delay_secs: i64) -> Self {
        self.base_delay_secs = base_delay_secs;
        self
    }

    /// One drain pass. The host scheduler calls this on its own cadence.
    pub async fn run_once(&self, now: DateTime<Utc>) -> FundResult<DispatchReport> {
        let due = self.outbox_repository.find_due(now, self.max_batch).await?;
        let mut report = DispatchReport::default();

        for entry in due {
            let envelope: EventEnvelope = match serde_json::from_value(entry.payload.clone()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    // Unreadable payloads stay queued; they need operator
                    // attention rather than silent loss.
                    tracing::error!(outbox_id = %entry.id, "undeliverable outbox payload: {e}");
                    let attempts = entry.attempts + 1;
                    self.outbox_repository
                        .reschedule(entry.id, attempts, now + self.backoff(attempts))
                        .await?;
                    report.rescheduled += 1;
                    continue;
                }
            };

            match self.publisher.publish(&envelope).await {
                Ok(()) => {
                    self.outbox_repository.mark_published(entry.id, now).await?;
                    report.published += 1;
                }
                Err(e) => {
                    let attempts = entry.attempts + 1;
                    let next = now + self.backoff(attempts);
                    tracing::warn!(
                        outbox_id = %entry.id,
                        event_type = entry.event_type.as_str(),
                        attempts,
                        "publish failed, retrying at {next}: {e}"
                    );
                    self.outbox_repository
                        .reschedule(entry.id, attempts, next)
                        .await?;
                    report.rescheduled += 1;
                }
            }
        }

        Ok(report)
    }

    /// Exponential backoff capped at ~17 minutes, with up to one base-delay
    /// of jitter to spread retry storms.
    fn backoff(&self, attempts: i32) -> Duration {
        let exponent = attempts.clamp(0, 10) as u32;
        let delay = self.base_delay_secs.saturating_mul(1i64 << exponent);
        let jitter = rand::thread_rng().gen_range(0..=self.base_delay_secs.max(1));
        Duration::seconds(delay + jitter)
    }
}
