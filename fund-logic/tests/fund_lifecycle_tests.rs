mod common;

use common::{default_config, harness, setup_active_fund};
use fund_api::{
    domain::{FundRole, FundStatus, InvitationStatus},
    service::{CreateFundRequest, FundService, InviteMemberRequest},
    FundError,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::test]
async fn create_fund_validates_config() {
    let h = harness().await;
    let mut config = default_config();
    config.monthly_interest_rate = Decimal::ZERO;
    let result = h
        .fund_service
        .create_fund(
            CreateFundRequest {
                name: "Bad Fund".to_string(),
                description: None,
                currency: "USD".to_string(),
                config,
            },
            Uuid::new_v4(),
        )
        .await;
    assert!(matches!(result, Err(FundError::Validation { .. })));
}

#[tokio::test]
async fn activation_requires_an_admin() {
    let h = harness().await;
    let actor = Uuid::new_v4();
    let fund = h
        .fund_service
        .create_fund(
            CreateFundRequest {
                name: "Fund".to_string(),
                description: None,
                currency: "USD".to_string(),
                config: default_config(),
            },
            actor,
        )
        .await
        .unwrap();

    let result = h.fund_service.activate_fund(fund.id, actor, fund.version).await;
    assert!(matches!(result, Err(FundError::InvalidState { .. })));

    h.fund_service
        .assign_role(fund.id, actor, FundRole::Admin, actor)
        .await
        .unwrap();
    let activated = h
        .fund_service
        .activate_fund(fund.id, actor, fund.version)
        .await
        .unwrap();
    assert_eq!(activated.status(), FundStatus::Active);
}

#[tokio::test]
async fn configuration_is_immutable_after_activation() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[]).await;

    let mut config = default_config();
    config.minimum_monthly_contribution = Decimal::new(20000, 2);
    let result = h
        .fund_service
        .update_configuration(fund.id, config, admin, fund.version)
        .await;
    assert!(matches!(result, Err(FundError::InvalidState { .. })));

    // Description stays mutable.
    let updated = h
        .fund_service
        .update_description(fund.id, Some("monthly savings circle".to_string()), admin, fund.version)
        .await
        .unwrap();
    assert_eq!(
        updated.description.as_ref().map(|d| d.as_str()),
        Some("monthly savings circle")
    );
}

#[tokio::test]
async fn duplicate_role_assignment_conflicts() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[]).await;

    let result = h
        .fund_service
        .assign_role(fund.id, admin, FundRole::Editor, admin)
        .await;
    assert!(matches!(result, Err(FundError::Conflict(_))));
}

#[tokio::test]
async fn last_admin_cannot_be_demoted_or_removed() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[]).await;

    let demote = h
        .fund_service
        .change_role(fund.id, admin, FundRole::Editor, admin)
        .await;
    assert!(matches!(demote, Err(FundError::LastAdmin { .. })));

    let remove = h.fund_service.remove_member(fund.id, admin, admin).await;
    assert!(matches!(remove, Err(FundError::LastAdmin { .. })));

    // A second admin unblocks the demotion.
    let other = Uuid::new_v4();
    h.fund_service
        .assign_role(fund.id, other, FundRole::Admin, admin)
        .await
        .unwrap();
    h.fund_service
        .change_role(fund.id, admin, FundRole::Editor, admin)
        .await
        .unwrap();
}

#[tokio::test]
async fn dissolution_blocks_new_members_and_dues() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let member = Uuid::new_v4();
    let fund = setup_active_fund(
        &h,
        default_config(),
        admin,
        &[(member, Decimal::new(10000, 2))],
    )
    .await;

    let fund = h
        .fund_service
        .find_fund_by_id(fund.id)
        .await
        .unwrap()
        .unwrap();
    let dissolving = h
        .fund_service
        .initiate_dissolution(fund.id, admin, fund.version)
        .await
        .unwrap();
    assert_eq!(dissolving.status(), FundStatus::Dissolving);

    let invite = h
        .fund_service
        .invite_member(InviteMemberRequest {
            fund_id: fund.id,
            target_contact: "late@example.org".to_string(),
            invited_by: admin,
            ttl_days: None,
        })
        .await;
    assert!(matches!(invite, Err(FundError::InvalidState { .. })));

    use fund_api::domain::MonthYear;
    use fund_api::service::ContributionService;
    let dues = h
        .contribution_service
        .generate_dues(fund.id, MonthYear::new(2025, 6).unwrap())
        .await;
    assert!(matches!(dues, Err(FundError::InvalidState { .. })));
}

#[tokio::test]
async fn stale_version_is_rejected() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[]).await;

    // The activation bumped the version; the pre-activation version is stale.
    let result = h
        .fund_service
        .update_description(fund.id, Some("stale".to_string()), admin, fund.version.saturating_sub(1))
        .await;
    assert!(matches!(result, Err(FundError::Conflict(_))));
}

#[tokio::test]
async fn invitation_lifecycle() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[]).await;

    let invitation = h
        .fund_service
        .invite_member(InviteMemberRequest {
            fund_id: fund.id,
            target_contact: "friend@example.org".to_string(),
            invited_by: admin,
            ttl_days: None,
        })
        .await
        .unwrap();
    assert_eq!(invitation.status, InvitationStatus::Pending);

    // Second pending invitation for the same contact is refused.
    let duplicate = h
        .fund_service
        .invite_member(InviteMemberRequest {
            fund_id: fund.id,
            target_contact: "friend@example.org".to_string(),
            invited_by: admin,
            ttl_days: None,
        })
        .await;
    assert!(matches!(duplicate, Err(FundError::AlreadyExists { .. })));

    let member = Uuid::new_v4();
    let plan = h
        .fund_service
        .accept_invitation(invitation.id, member, Decimal::new(15000, 2))
        .await
        .unwrap();
    assert_eq!(plan.monthly_contribution_amount, Decimal::new(15000, 2));
    assert!(plan.is_active);

    // Accepting twice fails; the invitation is no longer pending.
    let again = h
        .fund_service
        .accept_invitation(invitation.id, member, Decimal::new(15000, 2))
        .await;
    assert!(matches!(again, Err(FundError::InvalidState { .. })));

    // The member now holds a Guest role.
    let roles = h.db.roles.lock().unwrap();
    let assignment = roles
        .iter()
        .find(|r| r.fund_id == fund.id && r.user_id == member)
        .unwrap();
    assert_eq!(assignment.role, fund_db::models::FundRole::Guest);
}

#[tokio::test]
async fn below_minimum_plan_amount_is_rejected() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[]).await;

    let invitation = h
        .fund_service
        .invite_member(InviteMemberRequest {
            fund_id: fund.id,
            target_contact: "small@example.org".to_string(),
            invited_by: admin,
            ttl_days: None,
        })
        .await
        .unwrap();
    let result = h
        .fund_service
        .accept_invitation(invitation.id, Uuid::new_v4(), Decimal::new(100, 2))
        .await;
    assert!(matches!(result, Err(FundError::Validation { .. })));
}

#[tokio::test]
async fn fund_summary_reflects_membership() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let fund = setup_active_fund(
        &h,
        default_config(),
        admin,
        &[(a, Decimal::new(10000, 2)), (b, Decimal::new(10000, 2))],
    )
    .await;

    let summary = h.fund_service.fund_summary(fund.id).await.unwrap();
    assert_eq!(summary.member_count, 2);
    assert_eq!(summary.open_loan_count, 0);
    assert_eq!(summary.ledger_balance, Decimal::ZERO);
}
