use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use fund_api::{
    domain::{
        ContributionDue, ContributionDueStatus, ContributionReceipt, DomainEvent,
        DueGenerationReport, EventEnvelope, LedgerFilter, MonthYear, OverdueReport,
        ReferenceEntityType, Transaction, TransactionType,
    },
    service::{AuditSink, ContributionService, RecordContributionRequest},
    FundError, FundResult,
};
use fund_db::repository::{
    ContributionDueRepository, FundRepository, IdempotencyRepository, JobLockRepository,
    MembershipRepository, TransactionRepository,
};

use crate::{
    audit,
    events::{request_fingerprint, EventRecorder},
    mappers::{contribution_mapper, ContributionMapper, FundMapper},
    services::support,
};

const RECORD_PAYMENT_ENDPOINT: &str = "contributions/record-payment";
const OVERDUE_JOB: &str = "contribution-overdue";

/// Contributions engine: monthly due generation, payment recording against
/// the append-only ledger, and the overdue sweep.
pub struct ContributionServiceImpl {
    fund_repository: Arc<dyn FundRepository>,
    membership_repository: Arc<dyn MembershipRepository>,
    due_repository: Arc<dyn ContributionDueRepository>,
    transaction_repository: Arc<dyn TransactionRepository>,
    idempotency_repository: Arc<dyn IdempotencyRepository>,
    job_lock_repository: Arc<dyn JobLockRepository>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl ContributionServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fund_repository: Arc<dyn FundRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        due_repository: Arc<dyn ContributionDueRepository>,
        transaction_repository: Arc<dyn TransactionRepository>,
        idempotency_repository: Arc<dyn IdempotencyRepository>,
        job_lock_repository: Arc<dyn JobLockRepository>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            fund_repository,
            membership_repository,
            due_repository,
            transaction_repository,
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
impl ContributionService for ContributionServiceImpl {
    async fn generate_dues(
        &self,
        fund_id: Uuid,
        month_year: MonthYear,
    ) -> FundResult<DueGenerationReport> {
        let fund_model = self
            .fund_repository
            .find_by_id(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("Fund", fund_id))?;
        let fund = FundMapper::from_model(fund_model)?;

        // Dissolving funds stop generating new dues; in-flight obligations
        // keep running.
        if !fund.lifecycle.is_active() {
            return Err(FundError::invalid_state(
                "generate_dues",
                format!("{:?}", fund.status()),
            ));
        }

        let due_date = month_year.day(fund.config.contribution_day_of_month);
        let plans = self
            .membership_repository
            .find_active_plans_by_fund(fund_id)
            .await?;

        let now = Utc::now();
        let mut generated = 0u32;
        let mut skipped = 0u32;
        let mut total_amount = Decimal::ZERO;

        for plan in plans {
            if self
                .due_repository
                .exists(fund_id, plan.user_id, month_year.as_i32())
                .await?
            {
                skipped += 1;
                continue;
            }
            let due = ContributionDue {
                id: Uuid::new_v4(),
                fund_id,
                user_id: plan.user_id,
                month_year,
                amount_due: plan.monthly_contribution_amount,
                amount_paid: Decimal::ZERO,
                status: ContributionDueStatus::Pending,
                due_date,
                paid_date: None,
                missed_at: None,
                version: 0,
                created_at: now,
                updated_at: now,
            };
            self.due_repository
                .create(ContributionMapper::due_to_model(due))
                .await?;
            generated += 1;
            total_amount += plan.monthly_contribution_amount;
        }

        if generated > 0 {
            let envelope = EventEnvelope::new(
                fund_id,
                now,
                DomainEvent::ContributionDueGenerated {
                    month_year,
                    total_amount,
                    member_count: generated,
                },
            );
            let staged = self.events.enqueue(&envelope).await?;
            self.events.flush(&[staged]).await;
        }

        tracing::info!(%fund_id, %month_year, generated, skipped, "due generation run");
        Ok(DueGenerationReport {
            fund_id,
            month_year,
            generated,
            skipped,
            total_amount,
        })
    }

    async fn record_payment(
        &self,
        request: RecordContributionRequest,
    ) -> FundResult<ContributionReceipt> {
        request
            .validate()
            .map_err(|e| FundError::validation("request", e.to_string()))?;
        if request.amount <= Decimal::ZERO {
            return Err(FundError::validation("amount", "must be positive"));
        }
        support::bounded_key(&request.idempotency_key)?;

        let due_model = self
            .due_repository
            .find_by_id(request.due_id)
            .await?
            .ok_or_else(|| FundError::not_found("ContributionDue", request.due_id))?;
        let mut due = ContributionMapper::due_from_model(due_model)?;
        let fund_id = due.fund_id;

        let request_hash = request_fingerprint(&[
            &request.due_id.to_string(),
            &request.amount.to_string(),
            &request.expected_version.to_string(),
            &request.recorded_by.to_string(),
        ]);
        if let Some(receipt) = support::replay_idempotent::<ContributionReceipt>(
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

        if due.status == ContributionDueStatus::Paid {
            return Err(FundError::AlreadyPaid {
                entity: "ContributionDue".to_string(),
                id: due.id,
            });
        }
        if due.version != request.expected_version {
            return Err(FundError::version_conflict(
                "ContributionDue",
                due.id,
                request.expected_version,
            ));
        }
        if request.amount > due.remaining_balance() {
            return Err(FundError::validation(
                "amount",
                format!("exceeds remaining balance {}", due.remaining_balance()),
            ));
        }

        let before = due.clone();
        let now = Utc::now();
        due.amount_paid += request.amount;
        due.status = if due.remaining_balance().is_zero() {
            due.paid_date = Some(now.date_naive());
            ContributionDueStatus::Paid
        } else {
            ContributionDueStatus::Partial
        };
        due.updated_at = now;

        let transaction = Transaction {
            id: Uuid::new_v4(),
            fund_id,
            user_id: Some(due.user_id),
            transaction_type: TransactionType::Contribution,
            amount: request.amount,
            idempotency_key: support::bounded_key(&request.idempotency_key)?,
            reference_entity_type: Some(ReferenceEntityType::ContributionDue),
            reference_entity_id: Some(due.id),
            created_at: now,
        };

        let receipt = ContributionReceipt {
            due_id: due.id,
            fund_id,
            user_id: due.user_id,
            amount: request.amount,
            status: due.status,
            remaining_balance: due.remaining_balance(),
            transaction_id: transaction.id,
        };

        let idempotency = support::idempotency_record(
            fund_id,
            RECORD_PAYMENT_ENDPOINT,
            &request.idempotency_key,
            &request_hash,
            &receipt,
            now,
        )?;

        let envelope = EventEnvelope::new(
            fund_id,
            now,
            DomainEvent::ContributionPaid {
                due_id: due.id,
                user_id: due.user_id,
                amount: request.amount,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;

        let mut due_model = ContributionMapper::due_to_model(due.clone());
        due_model.version = request.expected_version;
        self.due_repository
            .record_payment(
                due_model,
                ContributionMapper::transaction_to_model(transaction),
                idempotency,
                vec![staged.clone()],
            )
            .await?;
        self.events.flush(&[staged]).await;

        self.record_audit(audit::build_envelope(
            request.recorded_by,
            Some(fund_id),
            "ContributionDue",
            due.id,
            "ContributionPaid",
            Some(&before),
            Some(&due),
            now,
        )?)
        .await;

        tracing::info!(
            due_id = %due.id,
            amount = %request.amount,
            status = ?receipt.status,
            "contribution payment recorded"
        );
        Ok(receipt)
    }

    async fn detect_overdue(
        &self,
        fund_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> FundResult<OverdueReport> {
        if !self
            .job_lock_repository
            .try_acquire(OVERDUE_JOB, fund_id)
            .await?
        {
            tracing::info!(%fund_id, "overdue sweep already running, skipping");
            return Ok(OverdueReport {
                fund_id,
                marked_late: 0,
                marked_missed: 0,
            });
        }

        let result = self.detect_overdue_locked(fund_id, as_of).await;
        self.job_lock_repository
            .release(OVERDUE_JOB, fund_id)
            .await?;
        result
    }

    async fn find_due_by_id(&self, due_id: Uuid) -> FundResult<Option<ContributionDue>> {
        self.due_repository
            .find_by_id(due_id)
            .await?
            .map(ContributionMapper::due_from_model)
            .transpose()
    }

    async fn find_dues_for_month(
        &self,
        fund_id: Uuid,
        month_year: MonthYear,
    ) -> FundResult<Vec<ContributionDue>> {
        self.due_repository
            .find_by_fund_month(fund_id, month_year.as_i32())
            .await?
            .into_iter()
            .map(ContributionMapper::due_from_model)
            .collect()
    }

    async fn ledger_entries(
        &self,
        fund_id: Uuid,
        filter: LedgerFilter,
    ) -> FundResult<Vec<Transaction>> {
        let models = self
            .transaction_repository
            .find_by_fund(
                fund_id,
                filter
                    .transaction_type
                    .map(contribution_mapper::transaction_type_to_model),
                filter.user_id,
                filter.from,
                filter.to,
            )
            .await?;
        Ok(models
            .into_iter()
            .map(ContributionMapper::transaction_from_model)
            .collect())
    }

    async fn fund_balance(&self, fund_id: Uuid) -> FundResult<Decimal> {
        use fund_db::models::TransactionType as Db;
        let contributions = self.transaction_repository.sum_by_type(fund_id, Db::Contribution);
        let disbursements = self.transaction_repository.sum_by_type(fund_id, Db::Disbursement);
        let repayments = self.transaction_repository.sum_by_type(fund_id, Db::Repayment);
        let interest = self.transaction_repository.sum_by_type(fund_id, Db::InterestIncome);
        let penalties = self.transaction_repository.sum_by_type(fund_id, Db::Penalty);
        Ok(contributions.await? - disbursements.await? + repayments.await? + interest.await?
            + penalties.await?)
    }

    async fn interest_pool(&self, fund_id: Uuid) -> FundResult<Decimal> {
        self.transaction_repository
            .sum_by_type(fund_id, fund_db::models::TransactionType::InterestIncome)
            .await
    }
}

impl ContributionServiceImpl {
    async fn detect_overdue_locked(
        &self,
        fund_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> FundResult<OverdueReport> {
        let fund_model = self
            .fund_repository
            .find_by_id(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("Fund", fund_id))?;
        let fund = FundMapper::from_model(fund_model)?;
        let grace = Duration::days(fund.config.grace_period_days);
        let as_of_date = as_of.date_naive();

        let mut marked_late = 0u32;
        let mut marked_missed = 0u32;

        for model in self.due_repository.find_unsettled_by_fund(fund_id).await? {
            let due = ContributionMapper::due_from_model(model)?;
            let late_from = due.due_date + grace;
            if as_of_date <= late_from {
                continue;
            }

            let mut updated = due.clone();
            let mut changed = false;
            let mut staged = Vec::new();

            if matches!(
                due.status,
                ContributionDueStatus::Pending | ContributionDueStatus::Partial
            ) {
                updated.status = ContributionDueStatus::Late;
                changed = true;
                let envelope = EventEnvelope::new(
                    fund_id,
                    as_of,
                    DomainEvent::ContributionOverdue {
                        due_id: due.id,
                        user_id: due.user_id,
                        remaining_balance: due.remaining_balance(),
                    },
                );
                staged.push(EventRecorder::stage(&envelope)?);
                marked_late += 1;
            }

            if let Some(missed_after) = fund.config.missed_after_days {
                let missed_from = due.due_date + Duration::days(missed_after);
                if as_of_date > missed_from && updated.missed_at.is_none() {
                    updated.missed_at = Some(as_of);
                    changed = true;
                    marked_missed += 1;
                }
            }

            if changed {
                updated.updated_at = as_of;
                self.due_repository
                    .update(ContributionMapper::due_to_model(updated), staged.clone())
                    .await?;
                self.events.flush(&staged).await;
            }
        }

        if marked_late > 0 || marked_missed > 0 {
            tracing::info!(%fund_id, marked_late, marked_missed, "overdue sweep complete");
        }
        Ok(OverdueReport {
            fund_id,
            marked_late,
            marked_missed,
        })
    }
}
