use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FundError, FundResult};

/// Who may approve a loan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanApprovalPolicy {
    AdminOnly,
    AdminWithVoting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyType {
    None,
    Flat,
    Percentage,
}

/// Fund configuration. Immutable (except via `UpdateConfiguration` in Draft)
/// once the fund leaves Draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundConfig {
    /// Per-month interest fraction in (0, 1], scale 4.
    pub monthly_interest_rate: Decimal,
    pub minimum_monthly_contribution: Decimal,
    pub minimum_principal_per_repayment: Decimal,
    pub loan_approval_policy: LoanApprovalPolicy,
    pub max_loan_per_member: Option<Decimal>,
    pub max_concurrent_loans: Option<i64>,
    pub overdue_penalty_type: PenaltyType,
    pub overdue_penalty_value: Decimal,
    /// Day of month dues fall on, in [1, 28] so every month qualifies.
    pub contribution_day_of_month: u32,
    pub grace_period_days: i64,
    /// Days past due after which a Late due is additionally stamped Missed.
    /// Absent means Missed is never produced.
    pub missed_after_days: Option<i64>,
}

impl FundConfig {
    pub fn validate(&self) -> FundResult<()> {
        if self.monthly_interest_rate <= Decimal::ZERO || self.monthly_interest_rate > Decimal::ONE
        {
            return Err(FundError::validation(
                "monthly_interest_rate",
                "must be in (0, 1]",
            ));
        }
        if self.minimum_monthly_contribution <= Decimal::ZERO {
            return Err(FundError::validation(
                "minimum_monthly_contribution",
                "must be greater than zero",
            ));
        }
        if self.minimum_principal_per_repayment <= Decimal::ZERO {
            return Err(FundError::validation(
                "minimum_principal_per_repayment",
                "must be greater than zero",
            ));
        }
        if let Some(max_loan) = self.max_loan_per_member {
            if max_loan <= Decimal::ZERO {
                return Err(FundError::validation(
                    "max_loan_per_member",
                    "must be greater than zero",
                ));
            }
        }
        if let Some(max_loans) = self.max_concurrent_loans {
            if max_loans < 1 {
                return Err(FundError::validation(
                    "max_concurrent_loans",
                    "must be at least 1",
                ));
            }
        }
        if self.overdue_penalty_value < Decimal::ZERO {
            return Err(FundError::validation(
                "overdue_penalty_value",
                "must not be negative",
            ));
        }
        if self.overdue_penalty_type != PenaltyType::None
            && self.overdue_penalty_value <= Decimal::ZERO
        {
            return Err(FundError::validation(
                "overdue_penalty_value",
                "must be positive when a penalty type is configured",
            ));
        }
        if !(1..=28).contains(&self.contribution_day_of_month) {
            return Err(FundError::validation(
                "contribution_day_of_month",
                "must be in [1, 28]",
            ));
        }
        if self.grace_period_days < 0 {
            return Err(FundError::validation(
                "grace_period_days",
                "must not be negative",
            ));
        }
        if let Some(missed) = self.missed_after_days {
            if missed < self.grace_period_days {
                return Err(FundError::validation(
                    "missed_after_days",
                    "must not be shorter than the grace period",
                ));
            }
        }
        Ok(())
    }
}

/// Flat status tag, used for persistence and event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundStatus {
    Draft,
    Active,
    Dissolving,
    Dissolved,
}

/// Fund lifecycle as a tagged state, each variant carrying the timestamps
/// that only exist in that state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FundLifecycle {
    Draft,
    Active {
        activated_at: DateTime<Utc>,
    },
    Dissolving {
        activated_at: DateTime<Utc>,
        initiated_at: DateTime<Utc>,
    },
    Dissolved {
        activated_at: DateTime<Utc>,
        initiated_at: DateTime<Utc>,
        dissolved_at: DateTime<Utc>,
    },
}

impl FundLifecycle {
    pub fn status(&self) -> FundStatus {
        match self {
            FundLifecycle::Draft => FundStatus::Draft,
            FundLifecycle::Active { .. } => FundStatus::Active,
            FundLifecycle::Dissolving { .. } => FundStatus::Dissolving,
            FundLifecycle::Dissolved { .. } => FundStatus::Dissolved,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, FundLifecycle::Draft)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, FundLifecycle::Active { .. })
    }

    pub fn is_dissolving(&self) -> bool {
        matches!(self, FundLifecycle::Dissolving { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FundLifecycle::Dissolved { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fund {
    pub id: Uuid,
    pub name: HeaplessString<100>,
    pub description: Option<HeaplessString<500>>,
    /// ISO currency tag; single-currency funds only.
    pub currency: HeaplessString<3>,
    pub config: FundConfig,
    pub lifecycle: FundLifecycle,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Fund {
    pub fn status(&self) -> FundStatus {
        self.lifecycle.status()
    }

    /// Draft -> Active. The admin-count precondition is checked by the
    /// service against role assignments before this transition runs.
    pub fn activate(&mut self, now: DateTime<Utc>) -> FundResult<()> {
        match self.lifecycle {
            FundLifecycle::Draft => {
                self.lifecycle = FundLifecycle::Active { activated_at: now };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(FundError::invalid_state(
                "activate",
                format!("{:?}", self.status()),
            )),
        }
    }

    /// Active -> Dissolving. Blocks new members, loan requests and due
    /// generation; in-flight repayments continue.
    pub fn initiate_dissolution(&mut self, now: DateTime<Utc>) -> FundResult<()> {
        match self.lifecycle {
            FundLifecycle::Active { activated_at } => {
                self.lifecycle = FundLifecycle::Dissolving {
                    activated_at,
                    initiated_at: now,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(FundError::invalid_state(
                "initiate_dissolution",
                format!("{:?}", self.status()),
            )),
        }
    }

    /// Dissolving -> Dissolved. Terminal; the fund is read-only afterwards.
    pub fn confirm_dissolution(&mut self, now: DateTime<Utc>) -> FundResult<()> {
        match self.lifecycle {
            FundLifecycle::Dissolving {
                activated_at,
                initiated_at,
            } => {
                self.lifecycle = FundLifecycle::Dissolved {
                    activated_at,
                    initiated_at,
                    dissolved_at: now,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(FundError::invalid_state(
                "confirm_dissolution",
                format!("{:?}", self.status()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FundConfig {
        FundConfig {
            monthly_interest_rate: Decimal::new(200, 4),
            minimum_monthly_contribution: Decimal::new(100000, 2),
            minimum_principal_per_repayment: Decimal::new(100000, 2),
            loan_approval_policy: LoanApprovalPolicy::AdminOnly,
            max_loan_per_member: None,
            max_concurrent_loans: None,
            overdue_penalty_type: PenaltyType::None,
            overdue_penalty_value: Decimal::ZERO,
            contribution_day_of_month: 5,
            grace_period_days: 3,
            missed_after_days: None,
        }
    }

    fn fund() -> Fund {
        let now = Utc::now();
        Fund {
            id: Uuid::new_v4(),
            name: HeaplessString::try_from("Test Fund").unwrap(),
            description: None,
            currency: HeaplessString::try_from("USD").unwrap(),
            config: config(),
            lifecycle: FundLifecycle::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut f = fund();
        let now = Utc::now();
        f.activate(now).unwrap();
        assert!(f.lifecycle.is_active());
        f.initiate_dissolution(now).unwrap();
        assert!(f.lifecycle.is_dissolving());
        f.confirm_dissolution(now).unwrap();
        assert!(f.lifecycle.is_terminal());
    }

    #[test]
    fn no_transition_leaves_terminal_state() {
        let mut f = fund();
        let now = Utc::now();
        f.activate(now).unwrap();
        f.initiate_dissolution(now).unwrap();
        f.confirm_dissolution(now).unwrap();
        assert!(f.activate(now).is_err());
        assert!(f.initiate_dissolution(now).is_err());
        assert!(f.confirm_dissolution(now).is_err());
    }

    #[test]
    fn cannot_skip_states() {
        let mut f = fund();
        let now = Utc::now();
        assert!(f.initiate_dissolution(now).is_err());
        assert!(f.confirm_dissolution(now).is_err());
    }

    #[test]
    fn config_validation() {
        let mut c = config();
        assert!(c.validate().is_ok());
        c.monthly_interest_rate = Decimal::ZERO;
        assert!(c.validate().is_err());
        c = config();
        c.contribution_day_of_month = 29;
        assert!(c.validate().is_err());
        c = config();
        c.overdue_penalty_type = PenaltyType::Flat;
        c.overdue_penalty_value = Decimal::ZERO;
        assert!(c.validate().is_err());
    }
}
