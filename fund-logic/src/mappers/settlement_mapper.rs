use fund_api::domain::{DissolutionLineItem, DissolutionSettlement, SettlementStatus};
use fund_db::models::{DissolutionLineItemModel, DissolutionSettlementModel};

pub struct SettlementMapper;

impl SettlementMapper {
    pub fn to_model(
        settlement: DissolutionSettlement,
    ) -> (DissolutionSettlementModel, Vec<DissolutionLineItemModel>) {
        let items = settlement
            .line_items
            .iter()
            .map(|item| DissolutionLineItemModel {
                id: item.id,
                settlement_id: item.settlement_id,
                user_id: item.user_id,
                total_paid_contributions: item.total_paid_contributions,
                interest_share: item.interest_share,
                gross_payout: item.gross_payout,
                outstanding_loan_principal: item.outstanding_loan_principal,
                unpaid_interest: item.unpaid_interest,
                unpaid_dues: item.unpaid_dues,
                net_payout: item.net_payout,
            })
            .collect();
        let model = DissolutionSettlementModel {
            id: settlement.id,
            fund_id: settlement.fund_id,
            status: status_to_model(settlement.status),
            total_contributions_collected: settlement.total_contributions_collected,
            total_interest_pool: settlement.total_interest_pool,
            settlement_date: settlement.settlement_date,
            version: settlement.version,
            created_at: settlement.created_at,
            updated_at: settlement.updated_at,
        };
        (model, items)
    }

    pub fn from_model(
        model: DissolutionSettlementModel,
        items: Vec<DissolutionLineItemModel>,
    ) -> DissolutionSettlement {
        DissolutionSettlement {
            id: model.id,
            fund_id: model.fund_id,
            status: status_from_model(model.status),
            total_contributions_collected: model.total_contributions_collected,
            total_interest_pool: model.total_interest_pool,
            settlement_date: model.settlement_date,
            line_items: items
                .into_iter()
                .map(|item| DissolutionLineItem {
                    id: item.id,
                    settlement_id: item.settlement_id,
                    user_id: item.user_id,
                    total_paid_contributions: item.total_paid_contributions,
                    interest_share: item.interest_share,
                    gross_payout: item.gross_payout,
                    outstanding_loan_principal: item.outstanding_loan_principal,
                    unpaid_interest: item.unpaid_interest,
                    unpaid_dues: item.unpaid_dues,
                    net_payout: item.net_payout,
                })
                .collect(),
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub fn status_to_model(status: SettlementStatus) -> fund_db::models::SettlementStatus {
    match status {
        SettlementStatus::Draft => fund_db::models::SettlementStatus::Draft,
        SettlementStatus::Ready => fund_db::models::SettlementStatus::Ready,
        SettlementStatus::Confirmed => fund_db::models::SettlementStatus::Confirmed,
    }
}

pub fn status_from_model(status: fund_db::models::SettlementStatus) -> SettlementStatus {
    match status {
        fund_db::models::SettlementStatus::Draft => SettlementStatus::Draft,
        fund_db::models::SettlementStatus::Ready => SettlementStatus::Ready,
        fund_db::models::SettlementStatus::Confirmed => SettlementStatus::Confirmed,
    }
}
