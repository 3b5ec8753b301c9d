use async_trait::async_trait;
use uuid::Uuid;

use crate::{domain::DissolutionSettlement, FundResult};

/// Terminal settlement: proportional interest allocation, per-member net
/// payouts, blocker detection and confirmation.
#[async_trait]
pub trait DissolutionService: Send + Sync {
    /// Recompute the settlement from the ledger and open obligations.
    /// The settlement becomes Ready only when no member nets negative;
    /// otherwise it stays Draft and the blockers are listed on the result.
    async fn recalculate(&self, fund_id: Uuid) -> FundResult<DissolutionSettlement>;

    /// Confirm a Ready settlement: terminal, moves the fund to Dissolved.
    async fn confirm(&self, fund_id: Uuid, actor_id: Uuid) -> FundResult<DissolutionSettlement>;

    async fn find_settlement_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Option<DissolutionSettlement>>;
}
