use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use fund_api::{
    domain::{
        bounded, DomainEvent, EventEnvelope, Loan, LoanState, LoanTerms, MemberLoanSummary,
        ReferenceEntityType, Transaction, TransactionType,
    },
    service::{AuditSink, LoanRequest, LoanService},
    FundError, FundResult,
};
use fund_db::repository::LoanRepository;

use crate::{
    audit,
    events::EventRecorder,
    mappers::{ContributionMapper, LoanMapper},
    projection::FundProjectionStore,
};

/// Loan origination service. Request validation runs against the local
/// fund projection; approval snapshots the projection's terms onto the
/// loan, which stays authoritative for repayment arithmetic.
pub struct LoanServiceImpl {
    loan_repository: Arc<dyn LoanRepository>,
    projections: Arc<FundProjectionStore>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl LoanServiceImpl {
    pub fn new(
        loan_repository: Arc<dyn LoanRepository>,
        projections: Arc<FundProjectionStore>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            loan_repository,
            projections,
            events,
            audit_sink,
        }
    }

    async fn load_loan(&self, loan_id: Uuid) -> FundResult<Loan> {
        let model = self
            .loan_repository
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| FundError::not_found("Loan", loan_id))?;
        LoanMapper::from_model(model)
    }

    async fn record_audit(&self, envelope: fund_api::domain::AuditEnvelope) {
        if let Err(e) = self.audit_sink.record(envelope).await {
            tracing::warn!("audit sink rejected envelope: {e}");
        }
    }
}

#[async_trait]
impl LoanService for LoanServiceImpl {
    async fn request_loan(&self, request: LoanRequest) -> FundResult<Loan> {
        if request.principal_amount <= Decimal::ZERO {
            return Err(FundError::validation(
                "principal_amount",
                "must be positive",
            ));
        }

        let projection = self
            .projections
            .get(request.fund_id)
            .await
            .ok_or_else(|| FundError::not_found("Fund", request.fund_id))?;
        if !projection.is_active {
            return Err(FundError::invalid_state("request_loan", "fund not Active"));
        }
        if let Some(limit) = projection.max_loan_per_member {
            if request.principal_amount > limit {
                return Err(FundError::MaxLoanExceeded {
                    requested: request.principal_amount,
                    limit,
                });
            }
        }
        if let Some(limit) = projection.max_concurrent_loans {
            let open = self
                .loan_repository
                .count_open_by_borrower(request.fund_id, request.borrower_id)
                .await?;
            if open >= limit {
                return Err(FundError::MaxConcurrentLoans { open, limit });
            }
        }

        let now = Utc::now();
        let loan = Loan {
            id: Uuid::new_v4(),
            fund_id: request.fund_id,
            borrower_id: request.borrower_id,
            principal_amount: request.principal_amount,
            requested_start_month: request.requested_start_month,
            purpose: request
                .purpose
                .as_deref()
                .map(|p| bounded::<200>("purpose", p))
                .transpose()?,
            outstanding_principal: request.principal_amount,
            state: LoanState::PendingApproval,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let envelope = EventEnvelope::new(
            request.fund_id,
            now,
            DomainEvent::LoanRequested {
                loan_id: loan.id,
                borrower_id: loan.borrower_id,
                principal: loan.principal_amount,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        self.loan_repository
            .create(LoanMapper::to_model(loan.clone()), vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        self.record_audit(audit::build_envelope(
            request.borrower_id,
            Some(request.fund_id),
            "Loan",
            loan.id,
            "LoanRequested",
            None::<&Loan>,
            Some(&loan),
            now,
        )?)
        .await;

        tracing::info!(loan_id = %loan.id, principal = %loan.principal_amount, "loan requested");
        Ok(loan)
    }

    async fn approve_loan(
        &self,
        loan_id: Uuid,
        approver_id: Uuid,
        scheduled_installment: Decimal,
        expected_version: i32,
    ) -> FundResult<Loan> {
        if scheduled_installment < Decimal::ZERO {
            return Err(FundError::validation(
                "scheduled_installment",
                "must not be negative",
            ));
        }

        let mut loan = self.load_loan(loan_id).await?;
        if loan.version != expected_version {
            return Err(FundError::version_conflict("Loan", loan_id, expected_version));
        }

        let projection = self
            .projections
            .get(loan.fund_id)
            .await
            .ok_or_else(|| FundError::not_found("Fund", loan.fund_id))?;

        let before = loan.clone();
        let now = Utc::now();
        let terms = LoanTerms {
            monthly_interest_rate: projection.monthly_interest_rate,
            scheduled_installment,
            minimum_principal: projection.minimum_principal_per_repayment,
        };
        // Approval and disbursement are one atomic step.
        loan.approve(approver_id, terms, now)?;
        loan.disburse(now)?;

        let disbursement_key = format!("loan-disb-{loan_id}");
        let disbursement = Transaction {
            id: Uuid::new_v4(),
            fund_id: loan.fund_id,
            user_id: Some(loan.borrower_id),
            transaction_type: TransactionType::Disbursement,
            amount: loan.principal_amount,
            idempotency_key: bounded::<64>("idempotency_key", &disbursement_key)?,
            reference_entity_type: Some(ReferenceEntityType::Loan),
            reference_entity_id: Some(loan_id),
            created_at: now,
        };

        let approved = EventEnvelope::new(
            loan.fund_id,
            now,
            DomainEvent::LoanApproved {
                loan_id,
                borrower_id: loan.borrower_id,
                principal: loan.principal_amount,
                installment: scheduled_installment,
            },
        );
        let disbursed = EventEnvelope::new(
            loan.fund_id,
            now,
            DomainEvent::LoanDisbursed {
                loan_id,
                borrower_id: loan.borrower_id,
                principal: loan.principal_amount,
            },
        );
        let staged = vec![
            EventRecorder::stage(&approved)?,
            EventRecorder::stage(&disbursed)?,
        ];

        let mut model = LoanMapper::to_model(loan);
        model.version = expected_version;
        let updated = self
            .loan_repository
            .approve_and_disburse(
                model,
                ContributionMapper::transaction_to_model(disbursement),
                staged.clone(),
            )
            .await?;
        self.events.flush(&staged).await;

        let loan = LoanMapper::from_model(updated)?;
        self.record_audit(audit::build_envelope(
            approver_id,
            Some(loan.fund_id),
            "Loan",
            loan_id,
            "LoanApproved",
            Some(&before),
            Some(&loan),
            now,
        )?)
        .await;

        tracing::info!(%loan_id, %approver_id, "loan approved and disbursed");
        Ok(loan)
    }

    async fn reject_loan(
        &self,
        loan_id: Uuid,
        rejected_by: Uuid,
        reason: String,
        expected_version: i32,
    ) -> FundResult<Loan> {
        let mut loan = self.load_loan(loan_id).await?;
        if loan.version != expected_version {
            return Err(FundError::version_conflict("Loan", loan_id, expected_version));
        }

        let before = loan.clone();
        let now = Utc::now();
        loan.reject(bounded::<200>("rejection_reason", reason.trim())?, now)?;

        let envelope = EventEnvelope::new(
            loan.fund_id,
            now,
            DomainEvent::LoanRejected {
                loan_id,
                borrower_id: loan.borrower_id,
                reason: reason.trim().to_string(),
            },
        );
        let staged = EventRecorder::stage(&envelope)?;

        let mut model = LoanMapper::to_model(loan);
        model.version = expected_version;
        let updated = self
            .loan_repository
            .update(model, vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        let loan = LoanMapper::from_model(updated)?;
        self.record_audit(audit::build_envelope(
            rejected_by,
            Some(loan.fund_id),
            "Loan",
            loan_id,
            "LoanRejected",
            Some(&before),
            Some(&loan),
            now,
        )?)
        .await;

        Ok(loan)
    }

    async fn find_loan_by_id(&self, loan_id: Uuid) -> FundResult<Option<Loan>> {
        self.loan_repository
            .find_by_id(loan_id)
            .await?
            .map(LoanMapper::from_model)
            .transpose()
    }

    async fn find_loans_by_borrower(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Vec<Loan>> {
        self.loan_repository
            .find_by_borrower(fund_id, user_id)
            .await?
            .into_iter()
            .map(LoanMapper::from_model)
            .collect()
    }

    async fn member_loan_summary(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<MemberLoanSummary> {
        let loans = self.find_loans_by_borrower(fund_id, user_id).await?;
        let open: Vec<_> = loans
            .into_iter()
            .filter(|loan| loan.status().is_open())
            .collect();
        Ok(MemberLoanSummary {
            fund_id,
            user_id,
            open_loans: open.len() as u32,
            total_outstanding_principal: open
                .iter()
                .map(|loan| loan.outstanding_principal)
                .sum(),
        })
    }
}
