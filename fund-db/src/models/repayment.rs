use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

/// Database model for the repayment_entries table.
/// Unique on (loan_id, month_year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentEntryModel {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub fund_id: Uuid,
    /// Encoded YYYYMM.
    pub month_year: i32,
    pub interest_due: Decimal,
    pub principal_due: Decimal,
    pub penalty_accrued: Decimal,
    pub amount_paid: Decimal,
    pub status: RepaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    /// Re-run guard: overdue source entry whose penalty landed here.
    pub penalty_applied_for: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
