use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use fund_api::{
    domain::{
        DissolutionLineItem, DissolutionSettlement, DomainEvent, EventEnvelope, SettlementStatus,
    },
    service::{AuditSink, DissolutionService},
    FundError, FundResult,
};
use fund_db::{
    models::TransactionType,
    repository::{
        ContributionDueRepository, FundRepository, LoanRepository, MembershipRepository,
        RepaymentRepository, SettlementRepository, TransactionRepository,
    },
};

use crate::{
    audit,
    events::EventRecorder,
    mappers::{loan_mapper, FundMapper, SettlementMapper},
    money,
};

/// Dissolution engine: proportional interest allocation, per-member net
/// payout computation, blocker detection and terminal confirmation.
pub struct DissolutionServiceImpl {
    fund_repository: Arc<dyn FundRepository>,
    membership_repository: Arc<dyn MembershipRepository>,
    loan_repository: Arc<dyn LoanRepository>,
    repayment_repository: Arc<dyn RepaymentRepository>,
    due_repository: Arc<dyn ContributionDueRepository>,
    transaction_repository: Arc<dyn TransactionRepository>,
    settlement_repository: Arc<dyn SettlementRepository>,
    events: EventRecorder,
    audit_sink: Arc<dyn AuditSink>,
}

impl DissolutionServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fund_repository: Arc<dyn FundRepository>,
        membership_repository: Arc<dyn MembershipRepository>,
        loan_repository: Arc<dyn LoanRepository>,
        repayment_repository: Arc<dyn RepaymentRepository>,
        due_repository: Arc<dyn ContributionDueRepository>,
        transaction_repository: Arc<dyn TransactionRepository>,
        settlement_repository: Arc<dyn SettlementRepository>,
        events: EventRecorder,
        audit_sink: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            fund_repository,
            membership_repository,
            loan_repository,
            repayment_repository,
            due_repository,
            transaction_repository,
            settlement_repository,
            events,
            audit_sink,
        }
    }

    async fn record_audit(&self, envelope: fund_api::domain::AuditEnvelope) {
        if let Err(e) = self.audit_sink.record(envelope).await {
            tracing::warn!("audit sink rejected envelope: {e}");
        }
    }

    /// Interest still owed on a borrower's repayment entries (penalties are
    /// settled through the entries themselves and not double-counted here).
    async fn unpaid_interest_for(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<Decimal> {
        let loans = self.loan_repository.find_by_borrower(fund_id, user_id).await?;
        let mut unpaid = Decimal::ZERO;
        for loan in loans {
            for entry in self.repayment_repository.find_by_loan(loan.id).await? {
                let total_due = entry.interest_due + entry.principal_due + entry.penalty_accrued;
                if total_due - entry.amount_paid <= Decimal::ZERO {
                    continue;
                }
                let interest_outstanding =
                    entry.interest_due - entry.amount_paid.min(entry.interest_due);
                unpaid += interest_outstanding;
            }
        }
        Ok(unpaid)
    }
}

#[async_trait]
impl DissolutionService for DissolutionServiceImpl {
    async fn recalculate(&self, fund_id: Uuid) -> FundResult<DissolutionSettlement> {
        let fund_model = self
            .fund_repository
            .find_by_id(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("Fund", fund_id))?;
        let fund = FundMapper::from_model(fund_model)?;
        if !fund.lifecycle.is_dissolving() {
            return Err(FundError::invalid_state(
                "recalculate_settlement",
                format!("{:?}", fund.status()),
            ));
        }

        let total_contributions = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::Contribution)
            .await?;
        let interest_pool = self
            .transaction_repository
            .sum_by_type(fund_id, TransactionType::InterestIncome)
            .await?;

        let existing = self.settlement_repository.find_by_fund(fund_id).await?;
        let (settlement_id, version, created_at) = match &existing {
            Some((model, _)) => (model.id, model.version, model.created_at),
            None => (Uuid::new_v4(), 0, Utc::now()),
        };

        let now = Utc::now();
        let mut line_items = Vec::new();
        for plan in self
            .membership_repository
            .find_active_plans_by_fund(fund_id)
            .await?
        {
            let user_id = plan.user_id;
            let paid = self
                .transaction_repository
                .sum_by_type_for_user(fund_id, TransactionType::Contribution, user_id)
                .await?;
            let interest_share = if total_contributions.is_zero() {
                Decimal::ZERO
            } else {
                money::round_money(interest_pool * paid / total_contributions)
            };

            let outstanding_loan_principal: Decimal = self
                .loan_repository
                .find_by_borrower(fund_id, user_id)
                .await?
                .into_iter()
                .filter(|loan| loan_mapper::status_from_model(loan.status).is_open())
                .map(|loan| loan.outstanding_principal)
                .sum();

            let unpaid_interest = self.unpaid_interest_for(fund_id, user_id).await?;

            let unpaid_dues: Decimal = self
                .due_repository
                .find_unsettled_by_user(fund_id, user_id)
                .await?
                .into_iter()
                .map(|due| due.amount_due - due.amount_paid)
                .filter(|balance| *balance > Decimal::ZERO)
                .sum();

            let gross_payout = paid + interest_share;
            line_items.push(DissolutionLineItem {
                id: Uuid::new_v4(),
                settlement_id,
                user_id,
                total_paid_contributions: paid,
                interest_share,
                gross_payout,
                outstanding_loan_principal,
                unpaid_interest,
                unpaid_dues,
                net_payout: gross_payout
                    - (outstanding_loan_principal + unpaid_interest + unpaid_dues),
            });
        }

        // Rounding residue goes to the largest contributor, ties broken by
        // the lexicographically smallest user id, so Σ share == pool exactly.
        let allocated: Decimal = line_items.iter().map(|item| item.interest_share).sum();
        let residue = interest_pool - allocated;
        if !residue.is_zero() && !line_items.is_empty() {
            let target = line_items
                .iter_mut()
                .max_by(|a, b| {
                    a.total_paid_contributions
                        .cmp(&b.total_paid_contributions)
                        .then_with(|| {
                            b.user_id
                                .to_string()
                                .cmp(&a.user_id.to_string())
                        })
                })
                .expect("non-empty line items");
            target.interest_share += residue;
            target.gross_payout += residue;
            target.net_payout += residue;
        }

        let status = if line_items.iter().any(|item| item.is_blocker()) {
            SettlementStatus::Draft
        } else {
            SettlementStatus::Ready
        };

        let settlement = DissolutionSettlement {
            id: settlement_id,
            fund_id,
            status,
            total_contributions_collected: total_contributions,
            total_interest_pool: interest_pool,
            settlement_date: None,
            line_items,
            version,
            created_at,
            updated_at: now,
        };

        let (model, items) = SettlementMapper::to_model(settlement.clone());
        let saved = self.settlement_repository.save(model, items.clone()).await?;

        let blockers = settlement.blockers();
        if !blockers.is_empty() {
            tracing::warn!(%fund_id, ?blockers, "settlement blocked by negative net payouts");
        } else {
            tracing::info!(%fund_id, "settlement ready for confirmation");
        }

        Ok(SettlementMapper::from_model(saved, items))
    }

    async fn confirm(&self, fund_id: Uuid, actor_id: Uuid) -> FundResult<DissolutionSettlement> {
        let (settlement_model, item_models) = self
            .settlement_repository
            .find_by_fund(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("DissolutionSettlement", fund_id))?;
        let mut settlement = SettlementMapper::from_model(settlement_model, item_models);

        if settlement.status != SettlementStatus::Ready {
            return Err(FundError::invalid_state(
                "confirm_dissolution",
                format!("{:?}", settlement.status),
            ));
        }

        let fund_model = self
            .fund_repository
            .find_by_id(fund_id)
            .await?
            .ok_or_else(|| FundError::not_found("Fund", fund_id))?;
        let mut fund = FundMapper::from_model(fund_model)?;

        let before = settlement.clone();
        let now = Utc::now();
        fund.confirm_dissolution(now)?;
        settlement.status = SettlementStatus::Confirmed;
        settlement.settlement_date = Some(now);
        settlement.updated_at = now;

        let envelope = EventEnvelope::new(
            fund_id,
            now,
            DomainEvent::FundDissolved {
                settlement_id: settlement.id,
            },
        );
        let staged = EventRecorder::stage(&envelope)?;

        let (settlement_model, item_models) = SettlementMapper::to_model(settlement.clone());
        let confirmed = self
            .settlement_repository
            .confirm(
                settlement_model,
                FundMapper::to_model(fund),
                vec![staged.clone()],
            )
            .await?;
        self.events.flush(&[staged]).await;

        let settlement = SettlementMapper::from_model(confirmed, item_models);
        self.record_audit(audit::build_envelope(
            actor_id,
            Some(fund_id),
            "DissolutionSettlement",
            settlement.id,
            "FundDissolved",
            Some(&before),
            Some(&settlement),
            now,
        )?)
        .await;

        tracing::info!(%fund_id, "fund dissolved");
        Ok(settlement)
    }

    async fn find_settlement_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Option<DissolutionSettlement>> {
        Ok(self
            .settlement_repository
            .find_by_fund(fund_id)
            .await?
            .map(|(model, items)| SettlementMapper::from_model(model, items)))
    }
}
