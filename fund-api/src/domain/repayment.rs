use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::MonthYear;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepaymentStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

/// Monthly obligation owed by a borrower for an active loan.
/// Unique on (loan_id, month_year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentEntry {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub fund_id: Uuid,
    pub month_year: MonthYear,
    pub interest_due: Decimal,
    pub principal_due: Decimal,
    /// Penalties carried into this month; no interest/principal split.
    pub penalty_accrued: Decimal,
    pub amount_paid: Decimal,
    pub status: RepaymentStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    /// Re-run guard: id of the overdue entry whose penalty landed here.
    pub penalty_applied_for: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepaymentEntry {
    pub fn total_due(&self) -> Decimal {
        self.interest_due + self.principal_due + self.penalty_accrued
    }

    pub fn remaining_balance(&self) -> Decimal {
        self.total_due() - self.amount_paid
    }

    /// Interest portion still unpaid; payments allocate to interest first.
    pub fn interest_outstanding(&self) -> Decimal {
        self.interest_due - self.amount_paid.min(self.interest_due)
    }

    /// Principal-due portion still unpaid after interest is covered.
    pub fn principal_due_remaining(&self) -> Decimal {
        let toward_principal = (self.amount_paid - self.interest_due).max(Decimal::ZERO);
        self.principal_due - toward_principal.min(self.principal_due)
    }

    pub fn is_settled(&self) -> bool {
        self.status == RepaymentStatus::Paid
    }

    pub fn is_outstanding(&self) -> bool {
        !self.is_settled() && self.remaining_balance() > Decimal::ZERO
    }
}

/// Result of recording a repayment, carrying the allocation split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    pub entry_id: Uuid,
    pub loan_id: Uuid,
    pub amount: Decimal,
    pub interest_paid: Decimal,
    pub principal_paid: Decimal,
    pub excess_to_principal: Decimal,
    pub entry_status: RepaymentStatus,
    pub new_outstanding_principal: Decimal,
    pub loan_closed: bool,
    pub transaction_id: Uuid,
}

/// Outcome of a penalty-application run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyRunReport {
    pub fund_id: Uuid,
    pub entries_inspected: u32,
    pub penalties_applied: u32,
    pub total_penalty_amount: Decimal,
}
