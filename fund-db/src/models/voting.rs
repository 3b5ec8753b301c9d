use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdType {
    Majority,
    Percentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingResult {
    Pending,
    Approved,
    Rejected,
    NoQuorum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteDecision {
    Approve,
    Reject,
}

/// Database model for the voting_sessions table. One per loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSessionModel {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub fund_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub threshold_type: ThresholdType,
    pub threshold_value: Decimal,
    pub result: VotingResult,
    pub finalised_by: Option<Uuid>,
    pub finalised_date: Option<DateTime<Utc>>,
    pub override_used: bool,
    pub created_at: DateTime<Utc>,
}

/// Immutable vote row. Unique on (session_id, voter_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteModel {
    pub id: Uuid,
    pub session_id: Uuid,
    pub voter_id: Uuid,
    pub decision: VoteDecision,
    pub cast_at: DateTime<Utc>,
}
