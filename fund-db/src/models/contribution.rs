use chrono::{DateTime, NaiveDate, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionDueStatus {
    Pending,
    Partial,
    Paid,
    Late,
    Missed,
}

/// Database model for the contribution_dues table.
/// Unique on (fund_id, user_id, month_year).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionDueModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Uuid,
    /// Encoded YYYYMM.
    pub month_year: i32,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub status: ContributionDueStatus,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub missed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
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

/// Append-only ledger row. Unique on (fund_id, idempotency_key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionModel {
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

/// Idempotency registry row. Unique on (fund_id, endpoint, idempotency_key).
/// `result_ref` holds the serialised original result so retries can replay it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecordModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub endpoint: HeaplessString<100>,
    pub idempotency_key: HeaplessString<64>,
    /// Blake3 hex digest of the canonical request body.
    pub request_hash: HeaplessString<64>,
    pub result_ref: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
