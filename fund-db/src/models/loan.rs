use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    PendingApproval,
    Approved,
    Active,
    Rejected,
    Closed,
}

/// Database model for the loans table. Snapshot and lifecycle columns are
/// nullable; which ones are set follows from `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub borrower_id: Uuid,
    pub principal_amount: Decimal,
    /// Encoded YYYYMM.
    pub requested_start_month: i32,
    pub purpose: Option<HeaplessString<200>>,
    pub outstanding_principal: Decimal,
    pub status: LoanStatus,
    pub monthly_interest_rate: Option<Decimal>,
    pub scheduled_installment: Option<Decimal>,
    pub minimum_principal: Option<Decimal>,
    pub approved_by: Option<Uuid>,
    pub approval_date: Option<DateTime<Utc>>,
    pub disbursement_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<HeaplessString<200>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub closed_date: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
