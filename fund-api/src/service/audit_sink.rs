use async_trait::async_trait;

use crate::{domain::AuditEnvelope, FundResult};

/// Append-only audit sink. One envelope per state-changing operation.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, envelope: AuditEnvelope) -> FundResult<()>;
}
