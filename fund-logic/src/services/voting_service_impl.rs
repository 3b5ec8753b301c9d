use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use fund_api::{
    domain::{
        DomainEvent, EventEnvelope, LoanStatus, ThresholdType, Vote, VoteDecision, VoteTally,
        VotingResult, VotingSession,
    },
    service::{AuditSink, StartVotingRequest, VotingService},
    FundError, FundResult,
};
use fund_db::repository::{LoanRepository, VotingRepository};

use crate::{
    audit,
    events::EventRecorder,
    mappers::{loan_mapper, VotingMapper},
};

/// Voting engine: session lifecycle, immutable votes, tally and admin
/// finalisation with override tracking.
pub struct VotingServiceImpl {
    voting_repository: Arc<dyn VotingRepository>,
    loan_repository: Arc<dyn LoanRepository>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl VotingServiceImpl {
    pub fn new(
        voting_repository: Arc<dyn VotingRepository>,
        loan_repository: Arc<dyn LoanRepository>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            voting_repository,
            loan_repository,
            events,
            audit_sink,
        }
    }

    async fn load_session(&self, session_id: Uuid) -> FundResult<VotingSession> {
        let model = self
            .voting_repository
            .find_session_by_id(session_id)
            .await?
            .ok_or_else(|| FundError::not_found("VotingSession", session_id))?;
        Ok(VotingMapper::session_from_model(model))
    }

    async fn record_audit(&self, envelope: fund_api::domain::AuditEnvelope) {
        if let Err(e) = self.audit_sink.record(envelope).await {
            tracing::warn!("audit sink rejected envelope: {e}");
        }
    }
}

#[async_trait]
impl VotingService for VotingServiceImpl {
    async fn start_voting(&self, request: StartVotingRequest) -> FundResult<VotingSession> {
        request
            .validate()
            .map_err(|e| FundError::validation("window_hours", e.to_string()))?;
        if request.threshold_type == ThresholdType::Percentage
            && (request.threshold_value < Decimal::ZERO
                || request.threshold_value > Decimal::from(100))
        {
            return Err(FundError::validation(
                "threshold_value",
                "percentage must be in [0, 100]",
            ));
        }

        let loan_model = self
            .loan_repository
            .find_by_id(request.loan_id)
            .await?
            .ok_or_else(|| FundError::not_found("Loan", request.loan_id))?;
        if loan_mapper::status_from_model(loan_model.status) != LoanStatus::PendingApproval {
            return Err(FundError::invalid_state(
                "start_voting",
                format!("{:?}", loan_model.status),
            ));
        }
        if self
            .voting_repository
            .find_session_by_loan(request.loan_id)
            .await?
            .is_some()
        {
            return Err(FundError::AlreadyExists {
                entity: "VotingSession".to_string(),
                key: request.loan_id.to_string(),
            });
        }

        let now = Utc::now();
        let session = VotingSession {
            id: Uuid::new_v4(),
            loan_id: request.loan_id,
            fund_id: loan_model.fund_id,
            window_start: now,
            window_end: now + Duration::hours(request.window_hours),
            threshold_type: request.threshold_type,
            threshold_value: request.threshold_value,
            result: VotingResult::Pending,
            finalised_by: None,
            finalised_date: None,
            override_used: false,
            created_at: now,
        };

        let envelope = EventEnvelope::new(
            session.fund_id,
            now,
            DomainEvent::VotingStarted {
                session_id: session.id,
                loan_id: request.loan_id,
                window_end: session.window_end,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let created = self
            .voting_repository
            .create_session(
                VotingMapper::session_to_model(session),
                vec![staged.clone()],
            )
            .await?;
        self.events.flush(&[staged]).await;

        let session = VotingMapper::session_from_model(created);
        self.record_audit(audit::build_envelope(
            request.started_by,
            Some(session.fund_id),
            "VotingSession",
            session.id,
            "VotingStarted",
            None::<&VotingSession>,
            Some(&session),
            now,
        )?)
        .await;

        tracing::info!(session_id = %session.id, loan_id = %request.loan_id, "voting started");
        Ok(session)
    }

    async fn cast_vote(
        &self,
        session_id: Uuid,
        voter_id: Uuid,
        decision: VoteDecision,
    ) -> FundResult<Vote> {
        let session = self.load_session(session_id).await?;
        if session.is_finalised() {
            return Err(FundError::AlreadyFinalised { session_id });
        }
        let now = Utc::now();
        if session.window_closed(now) {
            return Err(FundError::WindowClosed {
                session_id,
                window_end: session.window_end,
            });
        }
        if self
            .voting_repository
            .find_vote(session_id, voter_id)
            .await?
            .is_some()
        {
            return Err(FundError::AlreadyVoted {
                session_id,
                voter_id,
            });
        }

        let vote = Vote {
            id: Uuid::new_v4(),
            session_id,
            voter_id,
            decision,
            cast_at: now,
        };
        let envelope = EventEnvelope::new(
            session.fund_id,
            now,
            DomainEvent::VoteCast {
                session_id,
                voter_id,
                decision,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let created = self
            .voting_repository
            .create_vote(VotingMapper::vote_to_model(vote), vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        Ok(VotingMapper::vote_from_model(created))
    }

    async fn finalise_voting(
        &self,
        session_id: Uuid,
        admin_id: Uuid,
        admin_decision: VoteDecision,
    ) -> FundResult<VotingSession> {
        let mut session = self.load_session(session_id).await?;
        if session.is_finalised() {
            return Err(FundError::AlreadyFinalised { session_id });
        }

        let (approve, reject) = self.voting_repository.count_votes(session_id).await?;
        let natural = session.natural_outcome(approve, reject);
        let admin_result = match admin_decision {
            VoteDecision::Approve => VotingResult::Approved,
            VoteDecision::Reject => VotingResult::Rejected,
        };
        let override_used = natural != VotingResult::NoQuorum && admin_result != natural;

        let before = session.clone();
        let now = Utc::now();
        session.result = admin_result;
        session.finalised_by = Some(admin_id);
        session.finalised_date = Some(now);
        session.override_used = override_used;

        let envelope = EventEnvelope::new(
            session.fund_id,
            now,
            DomainEvent::VotingFinalised {
                session_id,
                loan_id: session.loan_id,
                result: admin_result,
                override_used,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let updated = self
            .voting_repository
            .update_session(
                VotingMapper::session_to_model(session),
                vec![staged.clone()],
            )
            .await?;
        self.events.flush(&[staged]).await;

        let session = VotingMapper::session_from_model(updated);
        let action = if override_used {
            "VotingFinalisedWithOverride"
        } else {
            "VotingFinalised"
        };
        self.record_audit(audit::build_envelope(
            admin_id,
            Some(session.fund_id),
            "VotingSession",
            session_id,
            action,
            Some(&before),
            Some(&session),
            now,
        )?)
        .await;

        tracing::info!(
            %session_id,
            result = ?session.result,
            override_used,
            natural = ?natural,
            "voting finalised"
        );
        Ok(session)
    }

    async fn find_session_by_loan(&self, loan_id: Uuid) -> FundResult<Option<VotingSession>> {
        Ok(self
            .voting_repository
            .find_session_by_loan(loan_id)
            .await?
            .map(VotingMapper::session_from_model))
    }

    async fn tally(&self, session_id: Uuid) -> FundResult<VoteTally> {
        // Resolve the session first so an unknown id is NotFound, not (0, 0).
        self.load_session(session_id).await?;
        let (approve, reject) = self.voting_repository.count_votes(session_id).await?;
        Ok(VoteTally { approve, reject })
    }
}
