use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{
    FundRole, FundRoleAssignmentModel, MemberContributionPlanModel, OutboxEntryModel,
};

/// Role assignments and member contribution plans, both owned by the fund.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Duplicate (fund, user) yields `Conflict`.
    async fn create_role_assignment(
        &self,
        assignment: FundRoleAssignmentModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundRoleAssignmentModel>;

    async fn find_role_assignment(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Option<FundRoleAssignmentModel>>;

    async fn find_role_assignments_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<FundRoleAssignmentModel>>;

    async fn update_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundRoleAssignmentModel>;

    async fn count_admins(&self, fund_id: Uuid) -> FundResult<i64>;

    /// Duplicate (fund, user) yields `Conflict`.
    async fn create_member_plan(
        &self,
        plan: MemberContributionPlanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<MemberContributionPlanModel>;

    async fn find_member_plan(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Option<MemberContributionPlanModel>>;

    async fn find_active_plans_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<MemberContributionPlanModel>>;

    /// Remove a member: delete the role assignment and deactivate the plan
    /// in one transaction.
    async fn remove_member(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<()>;
}
