use chrono::{DateTime, NaiveDate, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::MonthYear;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionDueStatus {
    Pending,
    Partial,
    Paid,
    Late,
    Missed,
}

/// Monthly obligation owed by a member. Unique on (fund_id, user_id, month_year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionDue {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Uuid,
    pub month_year: MonthYear,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub status: ContributionDueStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    /// Stamped once the fund's `missed_after_days` threshold passes.
    pub missed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContributionDue {
    pub fn remaining_balance(&self) -> Decimal {
        self.amount_due - self.amount_paid
    }

    pub fn is_settled(&self) -> bool {
        self.status == ContributionDueStatus::Paid
    }

    /// Pending/Partial/Late dues with a positive remaining balance still owe.
    pub fn is_outstanding(&self) -> bool {
        !self.is_settled() && self.remaining_balance() > Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Contribution,
    Disbursement,
    Repayment,
    InterestIncome,
    Penalty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceEntityType {
    ContributionDue,
    Loan,
    RepaymentEntry,
    DissolutionSettlement,
}

/// Append-only ledger entry. Every monetary side-effect in the system lands
/// here exactly once; unique on (fund_id, idempotency_key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub idempotency_key: HeaplessString<64>,
    pub reference_entity_type: Option<ReferenceEntityType>,
    pub reference_entity_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed contribution of this entry to the fund pool balance.
    ///
    /// balance = Σ Contribution − Σ Disbursement + Σ Repayment
    ///         + Σ InterestIncome + Σ Penalty
    pub fn signed_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Disbursement => -self.amount,
            _ => self.amount,
        }
    }
}

/// Filter for ledger queries.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub transaction_type: Option<TransactionType>,
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Outcome of an idempotent due-generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DueGenerationReport {
    pub fund_id: Uuid,
    pub month_year: MonthYear,
    pub generated: u32,
    pub skipped: u32,
    pub total_amount: Decimal,
}

/// Result of recording a contribution payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionReceipt {
    pub due_id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub status: ContributionDueStatus,
    pub remaining_balance: Decimal,
    pub transaction_id: Uuid,
}

/// Outcome of an overdue-detection sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueReport {
    pub fund_id: Uuid,
    pub marked_late: u32,
    pub marked_missed: u32,
}
