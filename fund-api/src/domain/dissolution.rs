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

/// Per-member accounting line produced on dissolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissolutionLineItem {
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

impl DissolutionLineItem {
    /// A negative net payout blocks confirmation.
    pub fn is_blocker(&self) -> bool {
        self.net_payout < Decimal::ZERO
    }
}

/// Terminal settlement for a dissolving fund. One per fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DissolutionSettlement {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub status: SettlementStatus,
    pub total_contributions_collected: Decimal,
    pub total_interest_pool: Decimal,
    pub settlement_date: Option<DateTime<Utc>>,
    pub line_items: Vec<DissolutionLineItem>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DissolutionSettlement {
    pub fn blockers(&self) -> Vec<Uuid> {
        self.line_items
            .iter()
            .filter(|item| item.is_blocker())
            .map(|item| item.user_id)
            .collect()
    }
}
