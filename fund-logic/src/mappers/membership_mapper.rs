use fund_api::domain::{
    FundRole, FundRoleAssignment, Invitation, InvitationStatus, MemberContributionPlan,
};
use fund_db::models::{FundRoleAssignmentModel, InvitationModel, MemberContributionPlanModel};

pub struct MembershipMapper;

impl MembershipMapper {
    pub fn role_to_model(assignment: FundRoleAssignment) -> FundRoleAssignmentModel {
        FundRoleAssignmentModel {
            id: assignment.id,
            fund_id: assignment.fund_id,
            user_id: assignment.user_id,
            role: role_to_model(assignment.role),
            assigned_by: assignment.assigned_by,
            created_at: assignment.created_at,
            updated_at: assignment.updated_at,
        }
    }

    pub fn role_from_model(model: FundRoleAssignmentModel) -> FundRoleAssignment {
        FundRoleAssignment {
            id: model.id,
            fund_id: model.fund_id,
            user_id: model.user_id,
            role: role_from_model(model.role),
            assigned_by: model.assigned_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn plan_to_model(plan: MemberContributionPlan) -> MemberContributionPlanModel {
        MemberContributionPlanModel {
            id: plan.id,
            fund_id: plan.fund_id,
            user_id: plan.user_id,
            monthly_contribution_amount: plan.monthly_contribution_amount,
            join_date: plan.join_date,
            is_active: plan.is_active,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }

    pub fn plan_from_model(model: MemberContributionPlanModel) -> MemberContributionPlan {
        MemberContributionPlan {
            id: model.id,
            fund_id: model.fund_id,
            user_id: model.user_id,
            monthly_contribution_amount: model.monthly_contribution_amount,
            join_date: model.join_date,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    pub fn invitation_to_model(invitation: Invitation) -> InvitationModel {
        InvitationModel {
            id: invitation.id,
            fund_id: invitation.fund_id,
            target_contact: invitation.target_contact,
            invited_by: invitation.invited_by,
            status: invitation_status_to_model(invitation.status),
            expires_at: invitation.expires_at,
            responded_at: invitation.responded_at,
            created_at: invitation.created_at,
        }
    }

    pub fn invitation_from_model(model: InvitationModel) -> Invitation {
        Invitation {
            id: model.id,
            fund_id: model.fund_id,
            target_contact: model.target_contact,
            invited_by: model.invited_by,
            status: invitation_status_from_model(model.status),
            expires_at: model.expires_at,
            responded_at: model.responded_at,
            created_at: model.created_at,
        }
    }
}

pub fn role_to_model(role: FundRole) -> fund_db::models::FundRole {
    match role {
        FundRole::Admin => fund_db::models::FundRole::Admin,
        FundRole::Editor => fund_db::models::FundRole::Editor,
        FundRole::Guest => fund_db::models::FundRole::Guest,
    }
}

pub fn role_from_model(role: fund_db::models::FundRole) -> FundRole {
    match role {
        fund_db::models::FundRole::Admin => FundRole::Admin,
        fund_db::models::FundRole::Editor => FundRole::Editor,
        fund_db::models::FundRole::Guest => FundRole::Guest,
    }
}

pub fn invitation_status_to_model(status: InvitationStatus) -> fund_db::models::InvitationStatus {
    match status {
        InvitationStatus::Pending => fund_db::models::InvitationStatus::Pending,
        InvitationStatus::Accepted => fund_db::models::InvitationStatus::Accepted,
        InvitationStatus::Declined => fund_db::models::InvitationStatus::Declined,
        InvitationStatus::Expired => fund_db::models::InvitationStatus::Expired,
    }
}

pub fn invitation_status_from_model(status: fund_db::models::InvitationStatus) -> InvitationStatus {
    match status {
        fund_db::models::InvitationStatus::Pending => InvitationStatus::Pending,
        fund_db::models::InvitationStatus::Accepted => InvitationStatus::Accepted,
        fund_db::models::InvitationStatus::Declined => InvitationStatus::Declined,
        fund_db::models::InvitationStatus::Expired => InvitationStatus::Expired,
    }
}
