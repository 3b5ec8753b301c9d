use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use fund_api::{
    domain::{
        bounded, DomainEvent, EventEnvelope, MonthYear, ReferenceEntityType, RepaymentEntry,
        RepaymentReceipt, RepaymentStatus, Transaction, TransactionType,
    },
    service::{AuditSink, RecordRepaymentRequest, RepaymentService},
    FundError, FundResult,
};
use fund_db::repository::{
    IdempotencyRepository, JobLockRepository, LoanRepository, RepaymentRepository,
};

use crate::{
    audit,
    events::{request_fingerprint, EventRecorder},
    mappers::{ContributionMapper, LoanMapper, RepaymentMapper},
    money,
    services::support,
};

const RECORD_PAYMENT_ENDPOINT: &str = "repayments/record-payment";
const OVERDUE_JOB: &str = "repayment-overdue";

/// Repayment engine: reducing-balance entry generation, interest-first
/// payment recording and loan auto-close.
pub struct RepaymentServiceImpl {
    loan_repository: Arc<dyn LoanRepository>,
    repayment_repository: Arc<dyn RepaymentRepository>,
    idempotency_repository: Arc<dyn IdempotencyRepository>,
    job_lock_repository: Arc<dyn JobLockRepository>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl RepaymentServiceImpl {
    pub fn new(
        loan_repository: Arc<dyn LoanRepository>,
        repayment_repository: Arc<dyn RepaymentRepository>,
        idempotency_repository: Arc<dyn IdempotencyRepository>,
        job_lock_repository: Arc<dyn JobLockRepository>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            loan_repository,
            repayment_repository,
            idempotency_repository,
            job_lock_repository,
            events,
            audit_sink,
        }
    }

    async fn record_audit(&self, envelope: fund_api::domain::AuditEnvelope) {
        if let Err(e) = self.audit_sink.record(envelope).await {
            tracing::warn!("audit sink rejected envelope: {e}");
        }
    }
}

#[async_trait]
impl RepaymentService for RepaymentServiceImpl {
    async fn generate_entry(
        &self,
        loan_id: Uuid,
        month_year: MonthYear,
    ) -> FundResult<RepaymentEntry> {
        // Idempotent on the unique (loan, month) key.
        if let Some(existing) = self
            .repayment_repository
            .find_by_loan_month(loan_id, month_year.as_i32())
            .await?
        {
            return RepaymentMapper::from_model(existing);
        }

        let loan_model = self
            .loan_repository
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| FundError::not_found("Loan", loan_id))?;
        let loan = LoanMapper::from_model(loan_model)?;

        let terms = match &loan.state {
            fund_api::domain::LoanState::Active { terms, .. } => *terms,
            _ => {
                return Err(FundError::invalid_state(
                    "generate_repayment_entry",
                    format!("{:?}", loan.status()),
                ))
            }
        };

        let interest_due =
            money::monthly_interest(loan.outstanding_principal, terms.monthly_interest_rate);
        let principal_due = money::principal_due(
            loan.outstanding_principal,
            terms.minimum_principal,
            terms.scheduled_installment,
            interest_due,
        );

        let now = Utc::now();
        let entry = RepaymentEntry {
            id: Uuid::new_v4(),
            loan_id,
            fund_id: loan.fund_id,
            month_year,
            interest_due,
            principal_due,
            penalty_accrued: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            status: RepaymentStatus::Pending,
            due_date: month_year.last_day(),
            paid_date: None,
            penalty_applied_for: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let envelope = EventEnvelope::new(
            loan.fund_id,
            now,
            DomainEvent::RepaymentDueGenerated {
                entry_id: entry.id,
                loan_id,
                month_year,
                interest_due,
                principal_due,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;
        let created = self
            .repayment_repository
            .create(RepaymentMapper::to_model(entry), vec![staged.clone()])
            .await?;
        self.events.flush(&[staged]).await;

        tracing::info!(
            %loan_id, %month_year, %interest_due, %principal_due,
            "repayment entry generated"
        );
        RepaymentMapper::from_model(created)
    }

    async fn record_payment(
        &self,
        request: RecordRepaymentRequest,
    ) -> FundResult<RepaymentReceipt> {
        request
            .validate()
            .map_err(|e| FundError::validation("request", e.to_string()))?;
        if request.amount <= Decimal::ZERO {
            return Err(FundError::validation("amount", "must be positive"));
        }
        support::bounded_key(&request.idempotency_key)?;

        let entry_model = self
            .repayment_repository
            .find_by_id(request.entry_id)
            .await?
            .ok_or_else(|| FundError::not_found("RepaymentEntry", request.entry_id))?;
        let mut entry = RepaymentMapper::from_model(entry_model)?;
        let fund_id = entry.fund_id;

        let request_hash = request_fingerprint(&[
            &request.entry_id.to_string(),
            &request.amount.to_string(),
            &request.expected_version.to_string(),
            &request.recorded_by.to_string(),
        ]);
        if let Some(receipt) = support::replay_idempotent::<RepaymentReceipt>(
            self.idempotency_repository.as_ref(),
            fund_id,
            RECORD_PAYMENT_ENDPOINT,
            &request.idempotency_key,
            request_hash.as_str(),
        )
        .await?
        {
            return Ok(receipt);
        }

        let loan_model = self
            .loan_repository
            .find_by_id(entry.loan_id)
            .await?
            .ok_or_else(|| FundError::not_found("Loan", entry.loan_id))?;
        let mut loan = LoanMapper::from_model(loan_model)?;

        if loan.status() != fund_api::domain::LoanStatus::Active {
            return Err(FundError::invalid_state(
                "record_repayment",
                format!("{:?}", loan.status()),
            ));
        }
        if entry.status == RepaymentStatus::Paid {
            return Err(FundError::AlreadyPaid {
                entity: "RepaymentEntry".to_string(),
                id: entry.id,
            });
        }
        if entry.version != request.expected_version {
            return Err(FundError::version_conflict(
                "RepaymentEntry",
                entry.id,
                request.expected_version,
            ));
        }

        let split = money::apply_payment(
            request.amount,
            entry.interest_outstanding(),
            entry.principal_due_remaining(),
            loan.outstanding_principal,
        );
        // Over-payment beyond the loan's outstanding principal is rejected;
        // the caller must shrink the amount.
        if split.excess_not_applied > Decimal::ZERO {
            return Err(FundError::validation(
                "amount",
                format!(
                    "exceeds what the loan can absorb by {}",
                    split.excess_not_applied
                ),
            ));
        }

        let entry_before = entry.clone();
        let loan_version = loan.version;
        let now = Utc::now();

        entry.amount_paid += request.amount;
        entry.status = if entry.amount_paid >= entry.total_due() {
            entry.paid_date = Some(now.date_naive());
            RepaymentStatus::Paid
        } else {
            RepaymentStatus::Partial
        };
        entry.updated_at = now;

        let loan_closed = loan.reduce_outstanding(split.new_outstanding, now)?;

        let cash_transaction = Transaction {
            id: Uuid::new_v4(),
            fund_id,
            user_id: Some(loan.borrower_id),
            transaction_type: TransactionType::Repayment,
            amount: request.amount,
            idempotency_key: support::bounded_key(&request.idempotency_key)?,
            reference_entity_type: Some(ReferenceEntityType::RepaymentEntry),
            reference_entity_id: Some(entry.id),
            created_at: now,
        };
        // Separate interest-income entry; it feeds the earnings report and
        // the dissolution pool.
        let interest_transaction = if split.interest_paid > Decimal::ZERO {
            let key = format!("int-{}", cash_transaction.id);
            Some(Transaction {
                id: Uuid::new_v4(),
                fund_id,
                user_id: Some(loan.borrower_id),
                transaction_type: TransactionType::InterestIncome,
                amount: split.interest_paid,
                idempotency_key: bounded::<64>("idempotency_key", &key)?,
                reference_entity_type: Some(ReferenceEntityType::RepaymentEntry),
                reference_entity_id: Some(entry.id),
                created_at: now,
            })
        } else {
            None
        };

        let receipt = RepaymentReceipt {
            entry_id: entry.id,
            loan_id: loan.id,
            amount: request.amount,
            interest_paid: split.interest_paid,
            principal_paid: split.principal_paid,
            excess_to_principal: split.excess_to_principal,
            entry_status: entry.status,
            new_outstanding_principal: split.new_outstanding,
            loan_closed,
            transaction_id: cash_transaction.id,
        };

        let idempotency = support::idempotency_record(
            fund_id,
            RECORD_PAYMENT_ENDPOINT,
            &request.idempotency_key,
            &request_hash,
            &receipt,
            now,
        )?;

        let mut staged = vec![EventRecorder::stage(&EventEnvelope::new(
            fund_id,
            now,
            DomainEvent::RepaymentRecorded {
                entry_id: entry.id,
                loan_id: loan.id,
                amount: request.amount,
                interest_paid: split.interest_paid,
                principal_paid: split.principal_paid,
                excess_to_principal: split.excess_to_principal,
            },
        ))?];
        if loan_closed {
            staged.push(EventRecorder::stage(&EventEnvelope::new(
                fund_id,
                now,
                DomainEvent::LoanClosed {
                    loan_id: loan.id,
                    borrower_id: loan.borrower_id,
                },
            ))?);
        }

        let mut entry_model = RepaymentMapper::to_model(entry.clone());
        entry_model.version = request.expected_version;
        let mut loan_model = LoanMapper::to_model(loan.clone());
        loan_model.version = loan_version;

        self.repayment_repository
            .record_payment(
                entry_model,
                loan_model,
                ContributionMapper::transaction_to_model(cash_transaction),
                interest_transaction.map(ContributionMapper::transaction_to_model),
                idempotency,
                staged.clone(),
            )
            .await?;
        self.events.flush(&staged).await;

        self.record_audit(audit::build_envelope(
            request.recorded_by,
            Some(fund_id),
            "RepaymentEntry",
            entry.id,
            "RepaymentRecorded",
            Some(&entry_before),
            Some(&entry),
            now,
        )?)
        .await;

        tracing::info!(
            entry_id = %entry.id,
            amount = %request.amount,
            interest = %split.interest_paid,
            principal = %split.principal_paid,
            excess = %split.excess_to_principal,
            loan_closed,
            "repayment recorded"
        );
        Ok(receipt)
    }

    async fn mark_overdue(&self, fund_id: Uuid, as_of: NaiveDate) -> FundResult<u32> {
        if !self
            .job_lock_repository
            .try_acquire(OVERDUE_JOB, fund_id)
            .await?
        {
            tracing::info!(%fund_id, "repayment overdue sweep already running, skipping");
            return Ok(0);
        }

        let result = self.mark_overdue_locked(fund_id, as_of).await;
        self.job_lock_repository
            .release(OVERDUE_JOB, fund_id)
            .await?;
        result
    }

    async fn find_entry_by_id(&self, entry_id: Uuid) -> FundResult<Option<RepaymentEntry>> {
        self.repayment_repository
            .find_by_id(entry_id)
            .await?
            .map(RepaymentMapper::from_model)
            .transpose()
    }

    async fn find_entries_by_loan(&self, loan_id: Uuid) -> FundResult<Vec<RepaymentEntry>> {
        self.repayment_repository
            .find_by_loan(loan_id)
            .await?
            .into_iter()
            .map(RepaymentMapper::from_model)
            .collect()
    }
}

impl RepaymentServiceImpl {
    async fn mark_overdue_locked(&self, fund_id: Uuid, as_of: NaiveDate) -> FundResult<u32> {
        let mut marked = 0u32;
        for model in self.repayment_repository.find_open_by_fund(fund_id).await? {
            let entry = RepaymentMapper::from_model(model)?;
            if as_of <= entry.due_date
                || !matches!(
                    entry.status,
                    RepaymentStatus::Pending | RepaymentStatus::Partial
                )
            {
                continue;
            }
            let mut updated = entry;
            updated.status = RepaymentStatus::Overdue;
            updated.updated_at = Utc::now();
            self.repayment_repository
                .update(RepaymentMapper::to_model(updated), vec![])
                .await?;
            marked += 1;
        }
        if marked > 0 {
            tracing::info!(%fund_id, marked, "repayment entries marked overdue");
        }
        Ok(marked)
    }
}
