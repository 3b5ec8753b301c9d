use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use fund_api::{
    domain::{DomainEvent, EventEnvelope, MonthYear, PenaltyRunReport, PenaltyType},
    service::{AuditSink, PenaltyService},
    FundError, FundResult,
};
use fund_db::{
    models::{RepaymentEntryModel, RepaymentStatus},
    repository::{FundRepository, JobLockRepository, RepaymentRepository},
};

use crate::{audit, events::EventRecorder, mappers::FundMapper};

const PENALTY_JOB: &str = "penalty-application";

/// Penalty engine: applies the fund's flat or percentage penalty for
/// overdue repayment entries onto the next month's entry for the same loan.
pub struct PenaltyServiceImpl {
    fund_repository: Arc<dyn FundRepository>,
    repayment_repository: Arc<dyn RepaymentRepository>,
    job_lock_repository: Arc<dyn JobLockRepository>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl PenaltyServiceImpl {
    pub fn new(
        fund_repository: Arc<dyn FundRepository>,
        repayment_repository: Arc<dyn RepaymentRepository>,
        job_lock_repository: Arc<dyn JobLockRepository>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            fund_repository,
            repayment_repository,
            job_lock_repository,
            events,
            audit_sink,
        }
    }
}

#[async_trait]
impl PenaltyService for PenaltyServiceImpl {
    async fn apply_penalties(
        &self,
        fund_id: Uuid,
        as_of: NaiveDate,
    ) -> FundResult<PenaltyRunReport> {
        if !self
            .job_lock_repository
            .try_acquire(PENALTY_JOB, fund_id)
            .await?
        {
            tracing::info!(%fund_id, "penalty run already in progress, skipping");
            return Ok(PenaltyRunReport {
                fund_id,
                entries_inspected: 0,
                penalties_applied: 0,
                total_penalty_amount: Decimal::ZERO,
            });
        }

        let result = self.apply_penalties_locked(fund_id, as_of).await;
        self.job_lock_repository
            .release(PENALTY_JOB, fund_id)
            .await?;
        result
    }
}

impl PenaltyServiceImpl {
    async fn apply_penalties_locked(
        &self,
        fund_id: Uuid,
        _as_of: NaiveDate,
    ) -> FundResult<PenaltyRunReport> {
        let fund_model = self
            .fund_repository
            .find_by_id(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("Fund", fund_id))?;
        let fund = FundMapper::from_model(fund_model)?;

        let mut report = PenaltyRunReport {
            fund_id,
            entries_inspected: 0,
            penalties_applied: 0,
            total_penalty_amount: Decimal::ZERO,
        };

        // Funds without a configured penalty are a no-op for this job.
        if fund.config.overdue_penalty_type == PenaltyType::None
            || fund.config.overdue_penalty_value <= Decimal::ZERO
        {
            return Ok(report);
        }

        let overdue = self
            .repayment_repository
            .find_overdue_by_fund(fund_id)
            .await?;

        for source in overdue {
            report.entries_inspected += 1;
            let overdue_amount =
                source.interest_due + source.principal_due + source.penalty_accrued
                    - source.amount_paid;
            if overdue_amount <= Decimal::ZERO {
                continue;
            }

            let penalty = match fund.config.overdue_penalty_type {
                PenaltyType::Flat => crate::money::round_money(fund.config.overdue_penalty_value),
                PenaltyType::Percentage => crate::money::round_money(
                    overdue_amount * fund.config.overdue_penalty_value / Decimal::from(100),
                ),
                PenaltyType::None => continue,
            };
            if penalty <= Decimal::ZERO {
                continue;
            }

            let target_month = MonthYear::from_yyyymm(source.month_year)?.next();
            let applied = self
                .apply_to_target(&fund, &source, target_month, penalty)
                .await?;
            if applied {
                report.penalties_applied += 1;
                report.total_penalty_amount += penalty;
            }
        }

        if report.penalties_applied > 0 {
            tracing::info!(
                %fund_id,
                applied = report.penalties_applied,
                total = %report.total_penalty_amount,
                "penalty run complete"
            );
        }
        Ok(report)
    }

    /// Add the penalty to next month's entry, or create a penalty-only
    /// entry when none exists. The `penalty_applied_for` marker makes
    /// re-runs skip already-penalised sources.
    async fn apply_to_target(
        &self,
        fund: &fund_api::domain::Fund,
        source: &RepaymentEntryModel,
        target_month: MonthYear,
        penalty: Decimal,
    ) -> FundResult<bool> {
        let now = Utc::now();
        let existing = self
            .repayment_repository
            .find_by_loan_month(source.loan_id, target_month.as_i32())
            .await?;

        let (entry_id, staged) = match existing {
            Some(mut target) => {
                if target.penalty_applied_for == Some(source.id) {
                    return Ok(false);
                }
                target.penalty_accrued += penalty;
                target.penalty_applied_for = Some(source.id);
                target.updated_at = now;
                let envelope = EventEnvelope::new(
                    fund.id,
                    now,
                    DomainEvent::RepaymentPenaltyApplied {
                        entry_id: target.id,
                        loan_id: target.loan_id,
                        month_year: target_month,
                        penalty,
                    },
                );
                let staged = EventRecorder::stage(&envelope)?;
                let id = target.id;
                self.repayment_repository
                    .update(target, vec![staged.clone()])
                    .await?;
                (id, staged)
            }
            None => {
                let entry = RepaymentEntryModel {
                    id: Uuid::new_v4(),
                    loan_id: source.loan_id,
                    fund_id: fund.id,
                    month_year: target_month.as_i32(),
                    interest_due: Decimal::ZERO,
                    principal_due: Decimal::ZERO,
                    penalty_accrued: penalty,
                    amount_paid: Decimal::ZERO,
                    status: RepaymentStatus::Pending,
                    due_date: target_month.day(15),
                    paid_date: None,
                    penalty_applied_for: Some(source.id),
                    version: 0,
                    created_at: now,
                    updated_at: now,
                };
                let envelope = EventEnvelope::new(
                    fund.id,
                    now,
                    DomainEvent::RepaymentPenaltyApplied {
                        entry_id: entry.id,
                        loan_id: entry.loan_id,
                        month_year: target_month,
                        penalty,
                    },
                );
                let staged = EventRecorder::stage(&envelope)?;
                let id = entry.id;
                self.repayment_repository
                    .create(entry, vec![staged.clone()])
                    .await?;
                (id, staged)
            }
        };
        self.events.flush(&[staged]).await;

        // System job; no human actor. The overdue source entry is the
        // before-state that justified the penalty.
        if let Err(e) = self
            .audit_sink
            .record(audit::build_envelope(
                Uuid::nil(),
                Some(fund.id),
                "RepaymentEntry",
                entry_id,
                "RepaymentPenaltyApplied",
                Some(source),
                None::<&RepaymentEntryModel>,
                now,
            )?)
            .await
        {
            tracing::warn!("audit sink rejected envelope: {e}");
        }

        Ok(true)
    }
}
