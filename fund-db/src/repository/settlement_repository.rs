use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{
    DissolutionLineItemModel, DissolutionSettlementModel, FundModel, OutboxEntryModel,
};

#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Upsert the settlement row and replace its line items wholesale,
    /// in one transaction.
    async fn save(
        &self,
        settlement: DissolutionSettlementModel,
        line_items: Vec<DissolutionLineItemModel>,
    ) -> FundResult<DissolutionSettlementModel>;

    async fn find_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Option<(DissolutionSettlementModel, Vec<DissolutionLineItemModel>)>>;

    /// Confirmation: version-checked settlement update plus the fund's
    /// Dissolving -> Dissolved transition in one transaction.
    async fn confirm(
        &self,
        settlement: DissolutionSettlementModel,
        fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<DissolutionSettlementModel>;
}
