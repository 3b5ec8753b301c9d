use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{
    FundRoleAssignmentModel, InvitationModel, MemberContributionPlanModel, OutboxEntryModel,
};

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn create(
        &self,
        invitation: InvitationModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<InvitationModel>;

    async fn find_by_id(&self, invitation_id: Uuid) -> FundResult<Option<InvitationModel>>;

    async fn find_pending(
        &self,
        fund_id: Uuid,
        target_contact: &str,
    ) -> FundResult<Option<InvitationModel>>;

    async fn update(&self, invitation: InvitationModel) -> FundResult<InvitationModel>;

    /// Accept: mark the invitation, create the member plan and the Guest
    /// role assignment in one transaction.
    async fn accept(
        &self,
        invitation: InvitationModel,
        plan: MemberContributionPlanModel,
        role: FundRoleAssignmentModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<MemberContributionPlanModel>;

    async fn find_expired_pending(
        &self,
        fund_id: Uuid,
        now: DateTime<Utc>,
    ) -> FundResult<Vec<InvitationModel>>;
}
