use async_trait::async_trait;
use moka::future::Cache;
use uuid::Uuid;

use fund_api::{
    domain::{DomainEvent, EventEnvelope, FundProjection},
    FundResult,
};

use crate::bus::EventConsumer;

/// Loans-local read model of fund policy, maintained by consuming fund
/// lifecycle events so loan validation never crosses into the fund
/// aggregate. Eventually consistent; the checks it backs are advisory.
pub struct FundProjectionStore {
    cache: Cache<Uuid, FundProjection>,
}

impl FundProjectionStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::new(10_000),
        }
    }

    pub async fn get(&self, fund_id: Uuid) -> Option<FundProjection> {
        self.cache.get(&fund_id).await
    }

    /// Test/bootstrap seam: install a projection directly.
    pub async fn put(&self, projection: FundProjection) {
        self.cache.insert(projection.fund_id, projection).await;
    }

    async fn set_inactive(&self, fund_id: Uuid) {
        if let Some(mut projection) = self.cache.get(&fund_id).await {
            projection.is_active = false;
            self.cache.insert(fund_id, projection).await;
        }
    }
}

impl Default for FundProjectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventConsumer for FundProjectionStore {
    async fn on_event(&self, envelope: &EventEnvelope) -> FundResult<()> {
        match &envelope.event {
            DomainEvent::FundCreated { config, .. } => {
                self.cache
                    .insert(
                        envelope.fund_id,
                        FundProjection {
                            fund_id: envelope.fund_id,
                            monthly_interest_rate: config.monthly_interest_rate,
                            minimum_principal_per_repayment: config
                                .minimum_principal_per_repayment,
                            max_loan_per_member: config.max_loan_per_member,
                            max_concurrent_loans: config.max_concurrent_loans,
                            loan_approval_policy: config.loan_approval_policy,
                            penalty_type: config.overdue_penalty_type,
                            penalty_value: config.overdue_penalty_value,
                            is_active: false,
                        },
                    )
                    .await;
            }
            DomainEvent::FundActivated { config } => {
                self.cache
                    .insert(
                        envelope.fund_id,
                        FundProjection {
                            fund_id: envelope.fund_id,
                            monthly_interest_rate: config.monthly_interest_rate,
                            minimum_principal_per_repayment: config
                                .minimum_principal_per_repayment,
                            max_loan_per_member: config.max_loan_per_member,
                            max_concurrent_loans: config.max_concurrent_loans,
                            loan_approval_policy: config.loan_approval_policy,
                            penalty_type: config.overdue_penalty_type,
                            penalty_value: config.overdue_penalty_value,
                            is_active: true,
                        },
                    )
                    .await;
            }
            DomainEvent::DissolutionInitiated | DomainEvent::FundDissolved { .. } => {
                self.set_inactive(envelope.fund_id).await;
            }
            _ => {}
        }
        Ok(())
    }
}
