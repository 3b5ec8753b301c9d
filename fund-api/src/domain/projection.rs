use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::fund::{LoanApprovalPolicy, PenaltyType};

/// Loans-local read model of fund policy, kept in step by consuming fund
/// lifecycle events. Advisory only; authoritative policy evaluation happens
/// inside the fund aggregate boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundProjection {
    pub fund_id: Uuid,
    pub monthly_interest_rate: Decimal,
    pub minimum_principal_per_repayment: Decimal,
    pub max_loan_per_member: Option<Decimal>,
    pub max_concurrent_loans: Option<i64>,
    pub loan_approval_policy: LoanApprovalPolicy,
    pub penalty_type: PenaltyType,
    pub penalty_value: Decimal,
    pub is_active: bool,
}
