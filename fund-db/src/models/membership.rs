use chrono::{DateTime, NaiveDate, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundRole {
    Admin,
    Editor,
    Guest,
}

/// Unique on (fund_id, user_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundRoleAssignmentModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub user_id: Uuid,
    pub role: FundRole,
    pub assigned_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unique on (fund_id, user_id). Amount never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberContributionPlanModel {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationModel {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub target_contact: HeaplessString<100>,
    pub invited_by: Uuid,
    pub status: InvitationStatus,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
