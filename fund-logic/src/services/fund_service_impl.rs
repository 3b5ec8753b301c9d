use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use fund_api::{
    domain::{
        bounded, DomainEvent, EventEnvelope, Fund, FundConfig, FundLifecycle, FundRole,
        FundRoleAssignment, Invitation, InvitationStatus, MemberContributionPlan,
    },
    service::{
        AuditSink, CreateFundRequest, FundService, FundSummary, InviteMemberRequest,
    },
    FundError, FundResult,
};
use fund_db::{
    models::TransactionType,
    repository::{
        FundRepository, InvitationRepository, LoanRepository, MembershipRepository,
        TransactionRepository,
    },
};

use crate::{
    audit,
    events::EventRecorder,
    mappers::{membership_mapper, FundMapper, MembershipMapper},
};

/// Fund aggregate service: lifecycle state machine, configuration guard,
/// role assignments, member plans and invitations.
pub struct FundServiceImpl {
    fund_repository: Arc<dyn FundRepository>,
    membership_repository: Arc<dyn MembershipRepository>,
    invitation_repository: Arc<dyn InvitationRepository>,
    loan_repository: Arc<dyn LoanRepository>,
    transaction_repository: Arc<dyn TransactionRepository>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl FundServiceImpl {
    pub fn new(
        fund_repository: Arc<dyn FundRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        invitation_repository: Arc<dyn InvitationRepository>,
        loan_repository: Arc<dyn LoanRepository>,
        transaction_repository: Arc<dyn TransactionRepository>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            fund_repository,
            membership_repository,
            invitation_repository,
            loan_repository,
            transaction_repository,
            events,
            audit_sink,
        }
    }

    async fn load_fund(&self, fund_id: Uuid) -> FundResult<Fund> {
        let model = self
            .fund_repository
            .find_by_id(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("Fund", fund_id))?;
        FundMapper::from_model(model)
    }

    fn check_version(fund: &Fund, expected_version: i32) -> FundResult<()> {
        if fund.version != expected_version {
            return Err(FundError::version_conflict("Fund", fund.id, expected_version));
        }
        Ok(())
    }

    async fn record_audit(&self, envelope: fund_api::domain::AuditEnvelope) {
        if let Err(e) = self.audit_sink.record(envelope).await {
            tracing::warn!("audit sink rejected envelope: {e}");
        }
    }

    /// Writes on a dissolved fund are refused outright.
    fn reject_if_terminal(fund: &Fund, operation: &str) -> FundResult<()> {
        if fund.lifecycle.is_terminal() {
            return Err(FundError::invalid_state(operation, "Dissolved"));
        }
        Ok(())
    }
}

#[async_trait]
impl FundService for FundServiceImpl {
    async fn create_fund(&self, request: CreateFundRequest, actor_id: Uuid) -> FundResult<Fund> {
        if request.name.trim().is_empty() {
            return Err(FundError::validation("name", "must not be empty"));
        }
        if request.currency.len() != 3 {
            return Err(FundError::validation("currency", "must be a 3-letter tag"));
        }
        request.config.validate()?;

        let now = Utc::now();
        let fund = Fund {
            id: Uuid::new_v4(),
            name: bounded::<100>("name", &request.name)?,
            description: request
                .description
                .as_deref()
                .map(|d| bounded::<500>("description", d))
                .transpose()?,
            currency: bounded::<3>("currency", &request.currency)?,
            config: request.config,
            lifecycle: FundLifecycle::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let envelope = EventEnvelope::new(
            fund.id,
            now,
            DomainEvent::FundCreated {
                name: fund.name.to_string(),
                config: fund.config.clone(),
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        self.fund_repository
            .create(FundMapper::to_model(fund.clone()), vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund.id),
            "Fund",
            fund.id,
            "FundCreated",
            None::<&Fund>,
            Some(&fund),
            now,
        )?)
        .await;

        tracing::info!(fund_id = %fund.id, "fund created in Draft");
        Ok(fund)
    }

    async fn find_fund_by_id(&self, fund_id: Uuid) -> FundResult<Option<Fund>> {
        self.fund_repository
            .find_by_id(fund_id)
            .await?
            .map(FundMapper::from_model)
            .transpose()
    }

    async fn update_description(
        &self,
        fund_id: Uuid,
        description: Option<String>,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund> {
        let mut fund = self.load_fund(fund_id).await?;
        Self::reject_if_terminal(&fund, "update_description")?;
        Self::check_version(&fund, expected_version)?;

        let before = fund.clone();
        let now = Utc::now();
        fund.description = description
            .as_deref()
            .map(|d| bounded::<500>("description", d))
            .transpose()?;
        fund.updated_at = now;

        let updated = self
            .fund_repository
            .update(FundMapper::to_model(fund), vec![])
            .await?;
        let fund = FundMapper::from_model(updated)?;

        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "Fund",
            fund_id,
            "FundDescriptionUpdated",
            Some(&before),
            Some(&fund),
            now,
        )?)
        .await;

        Ok(fund)
    }

    async fn update_configuration(
        &self,
        fund_id: Uuid,
        config: FundConfig,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund> {
        let mut fund = self.load_fund(fund_id).await?;
        if !fund.lifecycle.is_draft() {
            return Err(FundError::invalid_state(
                "update_configuration",
                format!("{:?}", fund.status()),
            ));
        }
        Self::check_version(&fund, expected_version)?;
        config.validate()?;

        let before = fund.clone();
        let now = Utc::now();
        fund.config = config;
        fund.updated_at = now;

        let updated = self
            .fund_repository
            .update(FundMapper::to_model(fund), vec![])
            .await?;
        let fund = FundMapper::from_model(updated)?;

        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "Fund",
            fund_id,
            "FundConfigurationUpdated",
            Some(&before),
            Some(&fund),
            now,
        )?)
        .await;

        Ok(fund)
    }

    async fn assign_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        actor_id: Uuid,
    ) -> FundResult<FundRoleAssignment> {
        let fund = self.load_fund(fund_id).await?;
        Self::reject_if_terminal(&fund, "assign_role")?;

        if self
            .membership_repository
            .find_role_assignment(fund_id, user_id)
            .await?
            .is_some()
        {
            return Err(FundError::Conflict(format!(
                "user {user_id} already holds a role in fund {fund_id}"
            )));
        }

        let now = Utc::now();
        let assignment = FundRoleAssignment {
            id: Uuid::new_v4(),
            fund_id,
            user_id,
            role,
            assigned_by: actor_id,
            created_at: now,
            updated_at: now,
        };

        let mut outbox = Vec::new();
        let mut staged = Vec::new();
        if role == FundRole::Admin {
            let envelope =
                EventEnvelope::new(fund_id, now, DomainEvent::FundAdminAssigned { user_id });
            let entry = EventRecorder::stage(&envelope)?;
            outbox.push(entry.clone());
            staged.push(entry);
        }

        let created = self
            .membership_repository
            .create_role_assignment(MembershipMapper::role_to_model(assignment), outbox)
            .await?;
        self.events.flush(&staged).await;

        let assignment = MembershipMapper::role_from_model(created);
        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "FundRoleAssignment",
            assignment.id,
            "RoleAssigned",
            None::<&FundRoleAssignment>,
            Some(&assignment),
            now,
        )?)
        .await;

        Ok(assignment)
    }

    async fn change_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        actor_id: Uuid,
    ) -> FundResult<FundRoleAssignment> {
        let fund = self.load_fund(fund_id).await?;
        Self::reject_if_terminal(&fund, "change_role")?;

        let existing = self
            .membership_repository
            .find_role_assignment(fund_id, user_id)
            .await?
            .ok_or_else(|| FundError::not_found("FundRoleAssignment", user_id))?;
        let before = MembershipMapper::role_from_model(existing);

        if before.role == FundRole::Admin
            && role != FundRole::Admin
            && self.membership_repository.count_admins(fund_id).await? <= 1
        {
            return Err(FundError::LastAdmin { fund_id });
        }

        let now = Utc::now();
        let mut outbox = Vec::new();
        let mut staged = Vec::new();
        if role == FundRole::Admin && before.role != FundRole::Admin {
            let envelope =
                EventEnvelope::new(fund_id, now, DomainEvent::FundAdminAssigned { user_id });
            let entry = EventRecorder::stage(&envelope)?;
            outbox.push(entry.clone());
            staged.push(entry);
        }

        let updated = self
            .membership_repository
            .update_role(fund_id, user_id, membership_mapper::role_to_model(role), outbox)
            .await?;
        self.events.flush(&staged).await;

        let assignment = MembershipMapper::role_from_model(updated);
        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "FundRoleAssignment",
            assignment.id,
            "RoleChanged",
            Some(&before),
            Some(&assignment),
            now,
        )?)
        .await;

        Ok(assignment)
    }

    async fn remove_member(&self, fund_id: Uuid, user_id: Uuid, actor_id: Uuid) -> FundResult<()> {
        let fund = self.load_fund(fund_id).await?;
        Self::reject_if_terminal(&fund, "remove_member")?;

        let existing = self
            .membership_repository
            .find_role_assignment(fund_id, user_id)
            .await?
            .ok_or_else(|| FundError::not_found("FundRoleAssignment", user_id))?;

        if existing.role == fund_db::models::FundRole::Admin
            && self.membership_repository.count_admins(fund_id).await? <= 1
        {
            return Err(FundError::LastAdmin { fund_id });
        }

        let now = Utc::now();
        let envelope = EventEnvelope::new(fund_id, now, DomainEvent::MemberRemoved { user_id });
        let staged = EventRecorder::stage(&envelope)?;
        self.membership_repository
            .remove_member(fund_id, user_id, vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "FundRoleAssignment",
            existing.id,
            "MemberRemoved",
            Some(&MembershipMapper::role_from_model(existing)),
            None::<&FundRoleAssignment>,
            now,
        )?)
        .await;

        Ok(())
    }

    async fn activate_fund(
        &self,
        fund_id: Uuid,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund> {
        let mut fund = self.load_fund(fund_id).await?;
        Self::check_version(&fund, expected_version)?;

        if self.membership_repository.count_admins(fund_id).await? < 1 {
            return Err(FundError::invalid_state(
                "activate_fund",
                "Draft without an Admin assignment",
            ));
        }

        let before = fund.clone();
        let now = Utc::now();
        fund.activate(now)?;

        let envelope = EventEnvelope::new(
            fund_id,
            now,
            DomainEvent::FundActivated {
                config: fund.config.clone(),
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let updated = self
            .fund_repository
            .update(FundMapper::to_model(fund), vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        let fund = FundMapper::from_model(updated)?;
        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "Fund",
            fund_id,
            "FundActivated",
            Some(&before),
            Some(&fund),
            now,
        )?)
        .await;

        tracing::info!(%fund_id, "fund activated");
        Ok(fund)
    }

    async fn initiate_dissolution(
        &self,
        fund_id: Uuid,
        actor_id: Uuid,
        expected_version: i32,
    ) -> FundResult<Fund> {
        let mut fund = self.load_fund(fund_id).await?;
        Self::check_version(&fund, expected_version)?;

        let before = fund.clone();
        let now = Utc::now();
        fund.initiate_dissolution(now)?;

        let envelope = EventEnvelope::new(fund_id, now, DomainEvent::DissolutionInitiated);
        let staged = EventRecorder::stage(&envelope)?;
        let updated = self
            .fund_repository
            .update(FundMapper::to_model(fund), vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        let fund = FundMapper::from_model(updated)?;
        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "Fund",
            fund_id,
            "DissolutionInitiated",
            Some(&before),
            Some(&fund),
            now,
        )?)
        .await;

        tracing::info!(%fund_id, "dissolution initiated");
        Ok(fund)
    }

    async fn invite_member(&self, request: InviteMemberRequest) -> FundResult<Invitation> {
        let fund = self.load_fund(request.fund_id).await?;
        if fund.lifecycle.is_dissolving() || fund.lifecycle.is_terminal() {
            return Err(FundError::invalid_state(
                "invite_member",
                format!("{:?}", fund.status()),
            ));
        }
        if request.target_contact.trim().is_empty() {
            return Err(FundError::validation("target_contact", "must not be empty"));
        }

        if let Some(pending) = self
            .invitation_repository
            .find_pending(request.fund_id, &request.target_contact)
            .await?
        {
            if pending.expires_at >= Utc::now() {
                return Err(FundError::AlreadyExists {
                    entity: "Invitation".to_string(),
                    key: request.target_contact.clone(),
                });
            }
        }

        let now = Utc::now();
        let ttl = request.ttl_days.unwrap_or(Invitation::DEFAULT_TTL_DAYS);
        if ttl <= 0 {
            return Err(FundError::validation("ttl_days", "must be positive"));
        }
        let invitation = Invitation {
            id: Uuid::new_v4(),
            fund_id: request.fund_id,
            target_contact: bounded::<100>("target_contact", &request.target_contact)?,
            invited_by: request.invited_by,
            status: InvitationStatus::Pending,
            expires_at: now + Duration::days(ttl),
            responded_at: None,
            created_at: now,
        };

        let envelope = EventEnvelope::new(
            request.fund_id,
            now,
            DomainEvent::InvitationSent {
                invitation_id: invitation.id,
                target_contact: invitation.target_contact.to_string(),
                invited_by: request.invited_by,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let created = self
            .invitation_repository
            .create(
                MembershipMapper::invitation_to_model(invitation),
                vec![staged.clone()],
            )
            .await?;
        self.events.flush(&[staged]).await;

        let invitation = MembershipMapper::invitation_from_model(created);
        self.record_audit(audit::build_envelope(
            request.invited_by,
            Some(request.fund_id),
            "Invitation",
            invitation.id,
            "InvitationSent",
            None::<&Invitation>,
            Some(&invitation),
            now,
        )?)
        .await;

        Ok(invitation)
    }

    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        user_id: Uuid,
        monthly_contribution_amount: Decimal,
    ) -> FundResult<MemberContributionPlan> {
        let model = self
            .invitation_repository
            .find_by_id(invitation_id)
            .await?
            .ok_or_else(|| FundError::not_found("Invitation", invitation_id))?;
        let mut invitation = MembershipMapper::invitation_from_model(model);

        if invitation.status != InvitationStatus::Pending {
            return Err(FundError::invalid_state(
                "accept_invitation",
                format!("{:?}", invitation.status),
            ));
        }
        let now = Utc::now();
        if now > invitation.expires_at {
            invitation.status = InvitationStatus::Expired;
            invitation.responded_at = Some(now);
            self.invitation_repository
                .update(MembershipMapper::invitation_to_model(invitation))
                .await?;
            return Err(FundError::invalid_state("accept_invitation", "Expired"));
        }

        let fund = self.load_fund(invitation.fund_id).await?;
        if fund.lifecycle.is_dissolving() || fund.lifecycle.is_terminal() {
            return Err(FundError::invalid_state(
                "accept_invitation",
                format!("{:?}", fund.status()),
            ));
        }
        if monthly_contribution_amount < fund.config.minimum_monthly_contribution {
            return Err(FundError::validation(
                "monthly_contribution_amount",
                format!(
                    "must be at least the fund minimum {}",
                    fund.config.minimum_monthly_contribution
                ),
            ));
        }

        invitation.status = InvitationStatus::Accepted;
        invitation.responded_at = Some(now);

        let plan = MemberContributionPlan {
            id: Uuid::new_v4(),
            fund_id: invitation.fund_id,
            user_id,
            monthly_contribution_amount,
            join_date: now.date_naive(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let role = FundRoleAssignment {
            id: Uuid::new_v4(),
            fund_id: invitation.fund_id,
            user_id,
            role: FundRole::Guest,
            assigned_by: invitation.invited_by,
            created_at: now,
            updated_at: now,
        };

        let envelope = EventEnvelope::new(
            invitation.fund_id,
            now,
            DomainEvent::MemberJoined {
                user_id,
                role: FundRole::Guest,
                monthly_contribution_amount,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let fund_id = invitation.fund_id;
        let created = self
            .invitation_repository
            .accept(
                MembershipMapper::invitation_to_model(invitation),
                MembershipMapper::plan_to_model(plan),
                MembershipMapper::role_to_model(role),
                vec![staged.clone()],
            )
            .await?;
        self.events.flush(&[staged]).await;

        let plan = MembershipMapper::plan_from_model(created);
        self.record_audit(audit::build_envelope(
            user_id,
            Some(fund_id),
            "MemberContributionPlan",
            plan.id,
            "MemberJoined",
            None::<&MemberContributionPlan>,
            Some(&plan),
            now,
        )?)
        .await;

        Ok(plan)
    }

    async fn decline_invitation(&self, invitation_id: Uuid) -> FundResult<Invitation> {
        let model = self
            .invitation_repository
            .find_by_id(invitation_id)
            .await?
            .ok_or_else(|| FundError::not_found("Invitation", invitation_id))?;
        let mut invitation = MembershipMapper::invitation_from_model(model);

        if invitation.status != InvitationStatus::Pending {
            return Err(FundError::invalid_state(
                "decline_invitation",
                format!("{:?}", invitation.status),
            ));
        }
        invitation.status = InvitationStatus::Declined;
        invitation.responded_at = Some(Utc::now());
        let updated = self
            .invitation_repository
            .update(MembershipMapper::invitation_to_model(invitation))
            .await?;
        Ok(MembershipMapper::invitation_from_model(updated))
    }

    async fn expire_invitations(&self, fund_id: Uuid) -> FundResult<u32> {
        let now = Utc::now();
        let expired = self
            .invitation_repository
            .find_expired_pending(fund_id, now)
            .await?;
        let mut count = 0u32;
        for mut invitation in expired {
            invitation.status = fund_db::models::InvitationStatus::Expired;
            invitation.responded_at = Some(now);
            self.invitation_repository.update(invitation).await?;
            count += 1;
        }
        if count > 0 {
            tracing::info!(%fund_id, count, "expired pending invitations");
        }
        Ok(count)
    }

    async fn fund_summary(&self, fund_id: Uuid) -> FundResult<FundSummary> {
        let fund = self.load_fund(fund_id).await?;

        let members = self
            .membership_repository
            .find_active_plans_by_fund(fund_id)
            .await?;
        let open_loans = self.loan_repository.find_open_by_fund(fund_id).await?;

        let contributions = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::Contribution)
            .await?;
        let disbursements = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::Disbursement)
            .await?;
        let repayments = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::Repayment)
            .await?;
        let interest = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::InterestIncome)
            .await?;
        let penalties = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::Penalty)
            .await?;

        Ok(FundSummary {
            fund_id,
            status: fund.status(),
            member_count: members.len() as u32,
            open_loan_count: open_loans.len() as u32,
            ledger_balance: contributions - disbursements + repayments + interest + penalties,
            interest_pool: interest,
        })
    }
}
