use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundStatus {
    Draft,
    Active,
    Dissolving,
    Dissolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanApprovalPolicy {
    AdminOnly,
    AdminWithVoting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyType {
    None,
    Flat,
    Percentage,
}

/// Database model for the funds table. Lifecycle timestamps are nullable
/// columns; which ones are set follows from `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundModel {
    pub id: Uuid,
    pub name: HeaplessString<100>,
    pub description: Option<HeaplessString<500>>,
    pub currency: HeaplessString<3>,
    pub monthly_interest_rate: Decimal,
    pub minimum_monthly_contribution: Decimal,
    pub minimum_principal_per_repayment: Decimal,
    pub loan_approval_policy: LoanApprovalPolicy,
    pub max_loan_per_member: Option<Decimal>,
    pub max_concurrent_loans: Option<i64>,
    pub overdue_penalty_type: PenaltyType,
    pub overdue_penalty_value: Decimal,
    pub contribution_day_of_month: i32,
    pub grace_period_days: i64,
    pub missed_after_days: Option<i64>,
    pub status: FundStatus,
    pub activated_at: Option<DateTime<Utc>>,
    pub dissolution_initiated_at: Option<DateTime<Utc>>,
    pub dissolved_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
