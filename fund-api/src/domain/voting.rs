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
pub enum VoteDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingResult {
    Pending,
    Approved,
    Rejected,
    NoQuorum,
}

/// Bounded-window collective decision attached to one loan approval.
/// At most one session exists per loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSession {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub fund_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub threshold_type: ThresholdType,
    /// Percentage threshold in [0, 100]; unused for Majority.
    pub threshold_value: Decimal,
    pub result: VotingResult,
    pub finalised_by: Option<Uuid>,
    pub finalised_date: Option<DateTime<Utc>>,
    pub override_used: bool,
    pub created_at: DateTime<Utc>,
}

impl VotingSession {
    pub const MIN_WINDOW_HOURS: i64 = 24;
    pub const MAX_WINDOW_HOURS: i64 = 72;

    pub fn is_finalised(&self) -> bool {
        self.result != VotingResult::Pending
    }

    pub fn window_closed(&self, now: DateTime<Utc>) -> bool {
        now > self.window_end
    }

    /// Outcome the tally alone would produce.
    pub fn natural_outcome(&self, approve: i64, reject: i64) -> VotingResult {
        let total = approve + reject;
        if total == 0 {
            return VotingResult::NoQuorum;
        }
        match self.threshold_type {
            ThresholdType::Majority => {
                if approve > reject {
                    VotingResult::Approved
                } else {
                    VotingResult::Rejected
                }
            }
            ThresholdType::Percentage => {
                let approve_pct = Decimal::from(approve * 100) / Decimal::from(total);
                if approve_pct >= self.threshold_value {
                    VotingResult::Approved
                } else {
                    VotingResult::Rejected
                }
            }
        }
    }
}

/// Immutable; unique on (session_id, voter_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub session_id: Uuid,
    pub voter_id: Uuid,
    pub decision: VoteDecision,
    pub cast_at: DateTime<Utc>,
}

/// Tally of a finalised (or in-flight) session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteTally {
    pub approve: i64,
    pub reject: i64,
}
