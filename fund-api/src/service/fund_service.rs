use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::{
        Fund, FundConfig, FundRole, FundRoleAssignment, FundStatus, Invitation,
        MemberContributionPlan,
    },
    FundResult,
};

/// Fund lifecycle, configuration and membership management.
///
/// Configuration is mutable only while the fund is Draft; activation gates
/// immutability. Every non-Draft fund keeps at least one Admin.
#[async_trait]
pub trait FundService: Send + Sync {
    /// Create a fund in Draft with its full configuration.
    async fn create_fund(&self, request: CreateFundRequest, actor_id: Uuid) -> FundResult<Fund>;

    async fn find_fund_by_id(&self, fund_id: Uuid) -> FundResult<Option<Fund>>;

    /// Description may change in any non-terminal state.
    async fn update_description(
        &self,
        fund_id: Uuid,
        description: Option<String>,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund>;

    /// Full config replacement; `InvalidState` unless the fund is Draft.
    async fn update_configuration(
        &self,
        fund_id: Uuid,
        config: FundConfig,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund>;

    /// Rejects duplicate (user, fund) assignments with `Conflict`.
    async fn assign_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        actor_id: Uuid,
    ) -> FundResult<FundRoleAssignment>;

    /// Refuses to demote the last Admin.
    async fn change_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        actor_id: Uuid,
    ) -> FundResult<FundRoleAssignment>;

    /// Refuses to remove the last Admin. Deactivates the member plan.
    async fn remove_member(&self, fund_id: Uuid, user_id: Uuid, actor_id: Uuid) -> FundResult<()>;

    /// Draft -> Active; requires at least one Admin assignment.
    async fn activate_fund(
        &self,
        fund_id: Uuid,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund>;

    /// Active -> Dissolving. New members, loan requests and due generation
    /// stop; in-flight repayments continue.
    async fn initiate_dissolution(
        &self,
        fund_id: Uuid,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund>;

    /// One pending invitation per (fund, contact); default TTL 7 days.
    async fn invite_member(&self, request: InviteMemberRequest) -> FundResult<Invitation>;

    /// Accepting creates the member's contribution plan (amount fixed at
    /// accept time) and a Guest role assignment.
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user_id: Uuid,
        monthly_contribution_amount: Decimal,
    ) -> FundResult<MemberContributionPlan>;

    async fn decline_invitation(&self, invitation_id: Uuid) -> FundResult<Invitation>;

    /// Sweep pending invitations past their TTL; returns how many expired.
    async fn expire_invitations(&self, fund_id: Uuid) -> FundResult<u32>;

    async fn fund_summary(&self, fund_id: Uuid) -> FundResult<FundSummary>;
}

#[derive(Debug, Clone)]
pub struct CreateFundRequest {
    pub name: String,
    pub description: Option<String>,
    pub currency: String,
    pub config: FundConfig,
}

#[derive(Debug, Clone)]
pub struct InviteMemberRequest {
    pub fund_id: Uuid,
    pub target_contact: String,
    pub invited_by: Uuid,
    /// Overrides the 7-day default when set.
    pub ttl_days: Option<i64>,
}

/// Back-office dashboard aggregate for one fund.
#[derive(Debug, Clone)]
pub struct FundSummary {
    pub fund_id: Uuid,
    pub status: FundStatus,
    pub member_count: u32,
    pub open_loan_count: u32,
    pub ledger_balance: Decimal,
    pub interest_pool: Decimal,
}
