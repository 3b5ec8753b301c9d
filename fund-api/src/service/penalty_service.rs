use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{domain::PenaltyRunReport, FundResult};

/// Periodic per-fund penalty application over overdue repayment entries.
///
/// The configured flat or percentage penalty lands on the next month's
/// entry for the same loan; a marker on the target entry prevents
/// double-application across re-runs.
#[async_trait]
pub trait PenaltyService: Send + Sync {
    async fn apply_penalties(&self, fund_id: Uuid, as_of: NaiveDate)
        -> FundResult<PenaltyRunReport>;
}
