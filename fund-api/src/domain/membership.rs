use chrono::{DateTime, NaiveDate, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fund-scoped role. Every non-Draft fund keeps at least one Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundRole {
    Admin,
    Editor,
    Guest,
}

/// Unique on (user_id, fund_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRoleAssignment {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Uuid,
    pub role: FundRole,
    pub assigned_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A member's standing monthly contribution commitment.
/// The amount is fixed at creation; unique on (user_id, fund_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberContributionPlan {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Uuid,
    pub monthly_contribution_amount: Decimal,
    pub join_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

/// One pending invitation per (fund_id, target_contact) at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub target_contact: HeaplessString<100>,
    pub invited_by: Uuid,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Default invitation TTL.
    pub const DEFAULT_TTL_DAYS: i64 = 7;

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now <= self.expires_at
    }
}
