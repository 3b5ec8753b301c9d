use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::MonthYear;
use crate::error::{FundError, FundResult};

/// Flat status tag, used for persistence, queries and event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    PendingApproval,
    Approved,
    Active,
    Rejected,
    Closed,
}

impl LoanStatus {
    /// Statuses counted against `max_concurrent_loans`.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            LoanStatus::PendingApproval | LoanStatus::Approved | LoanStatus::Active
        )
    }
}

/// Fund terms captured at approval time. These stay authoritative for all
/// repayment arithmetic on this loan, regardless of later fund changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub monthly_interest_rate: Decimal,
    pub scheduled_installment: Decimal,
    pub minimum_principal: Decimal,
}

/// Loan lifecycle as a tagged state; each variant carries only the fields
/// that exist in that state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoanState {
    PendingApproval,
    Approved {
        terms: LoanTerms,
        approved_by: Uuid,
        approval_date: DateTime<Utc>,
    },
    Active {
        terms: LoanTerms,
        approved_by: Uuid,
        approval_date: DateTime<Utc>,
        disbursement_date: DateTime<Utc>,
    },
    Rejected {
        reason: HeaplessString<200>,
        rejected_at: DateTime<Utc>,
    },
    Closed {
        terms: LoanTerms,
        approved_by: Uuid,
        approval_date: DateTime<Utc>,
        disbursement_date: DateTime<Utc>,
        closed_date: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,
    pub fund_id: Uuid,
    pub borrower_id: Uuid,
    pub principal_amount: Decimal,
    pub requested_start_month: MonthYear,
    pub purpose: Option<HeaplessString<200>>,
    /// Invariant: in [0, principal_amount]; zero while Active closes the loan.
    pub outstanding_principal: Decimal,
    pub state: LoanState,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        match self.state {
            LoanState::PendingApproval => LoanStatus::PendingApproval,
            LoanState::Approved { .. } => LoanStatus::Approved,
            LoanState::Active { .. } => LoanStatus::Active,
            LoanState::Rejected { .. } => LoanStatus::Rejected,
            LoanState::Closed { .. } => LoanStatus::Closed,
        }
    }

    pub fn terms(&self) -> Option<&LoanTerms> {
        match &self.state {
            LoanState::Approved { terms, .. }
            | LoanState::Active { terms, .. }
            | LoanState::Closed { terms, .. } => Some(terms),
            _ => None,
        }
    }

    /// PendingApproval -> Approved, snapshotting fund terms.
    pub fn approve(
        &mut self,
        approver_id: Uuid,
        terms: LoanTerms,
        now: DateTime<Utc>,
    ) -> FundResult<()> {
        match self.state {
            LoanState::PendingApproval => {
                self.state = LoanState::Approved {
                    terms,
                    approved_by: approver_id,
                    approval_date: now,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(FundError::invalid_state(
                "approve_loan",
                format!("{:?}", self.status()),
            )),
        }
    }

    /// Approved -> Active; the pool pays out the principal.
    pub fn disburse(&mut self, now: DateTime<Utc>) -> FundResult<()> {
        match self.state {
            LoanState::Approved {
                terms,
                approved_by,
                approval_date,
            } => {
                self.state = LoanState::Active {
                    terms,
                    approved_by,
                    approval_date,
                    disbursement_date: now,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(FundError::invalid_state(
                "disburse_loan",
                format!("{:?}", self.status()),
            )),
        }
    }

    /// PendingApproval -> Rejected with a non-empty reason.
    pub fn reject(&mut self, reason: HeaplessString<200>, now: DateTime<Utc>) -> FundResult<()> {
        if reason.is_empty() {
            return Err(FundError::validation(
                "rejection_reason",
                "must not be empty",
            ));
        }
        match self.state {
            LoanState::PendingApproval => {
                self.state = LoanState::Rejected {
                    reason,
                    rejected_at: now,
                };
                self.updated_at = now;
                Ok(())
            }
            _ => Err(FundError::invalid_state(
                "reject_loan",
                format!("{:?}", self.status()),
            )),
        }
    }

    /// Apply a principal reduction. Returns true when the loan auto-closed
    /// because the outstanding principal reached zero.
    pub fn reduce_outstanding(
        &mut self,
        new_outstanding: Decimal,
        now: DateTime<Utc>,
    ) -> FundResult<bool> {
        if new_outstanding < Decimal::ZERO || new_outstanding > self.principal_amount {
            return Err(FundError::validation(
                "outstanding_principal",
                "must stay within [0, principal_amount]",
            ));
        }
        match self.state {
            LoanState::Active {
                terms,
                approved_by,
                approval_date,
                disbursement_date,
            } => {
                self.outstanding_principal = new_outstanding;
                self.updated_at = now;
                if new_outstanding.is_zero() {
                    self.state = LoanState::Closed {
                        terms,
                        approved_by,
                        approval_date,
                        disbursement_date,
                        closed_date: now,
                    };
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => Err(FundError::invalid_state(
                "reduce_outstanding",
                format!("{:?}", self.status()),
            )),
        }
    }
}

/// Open-loan position of one borrower, backing the concurrent-loan cap and
/// dissolution line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberLoanSummary {
    pub fund_id: Uuid,
    pub user_id: Uuid,
    pub open_loans: u32,
    pub total_outstanding_principal: Decimal,
}
