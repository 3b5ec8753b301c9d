use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    Draft,
    Ready,
    Confirmed,
}

/// Database model for the dissolution_settlements table. One per fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissolutionSettlementModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub status: SettlementStatus,
    pub total_contributions_collected: Decimal,
    pub total_interest_pool: Decimal,
    pub settlement_date: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line items are replaced wholesale on every recalculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissolutionLineItemModel {
    pub id: Uuid,
    pub settlement_id: Uuid,
    pub user_id: Uuid,
    pub total_paid_contributions: Decimal,
    pub interest_share: Decimal,
    pub gross_payout: Decimal,
    pub outstanding_loan_principal: Decimal,
    pub unpaid_interest: Decimal,
    pub unpaid_dues: Decimal,
    pub net_payout: Decimal,
}
