use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::{Loan, MemberLoanSummary, MonthYear},
    FundResult,
};

/// Loan origination: request validation against fund policy, approval with
/// config snapshotting, disbursement and rejection.
#[async_trait]
pub trait LoanService: Send + Sync {
    /// Validate against the fund projection (fund active, per-member cap,
    /// concurrent-loan cap) and create the loan in PendingApproval.
    async fn request_loan(&self, request: LoanRequest) -> FundResult<Loan>;

    /// PendingApproval -> Approved -> Active in one atomic step. Snapshots
    /// the fund's interest rate and minimum principal; those snapshots stay
    /// authoritative for this loan's repayment arithmetic.
    ///
    /// Under `AdminWithVoting` the caller is expected to hold a finalised
    /// approving vote first; this is advisory and reflected in the audit
    /// trail, not enforced here.
    async fn approve_loan(
        &self,
        loan_id: Uuid,
        approver_id: Uuid,
        scheduled_installment: Decimal,
        expected_version: i32,
    ) -> FundResult<Loan>;

    /// PendingApproval -> Rejected with a non-empty reason.
    async fn reject_loan(
        &self,
        loan_id: Uuid,
        rejected_by: Uuid,
        reason: String,
        expected_version: i32,
    ) -> FundResult<Loan>;

    async fn find_loan_by_id(&self, loan_id: Uuid) -> FundResult<Option<Loan>>;

    async fn find_loans_by_borrower(&self, fund_id: Uuid, user_id: Uuid)
        -> FundResult<Vec<Loan>>;

    /// Open-loan position for one borrower.
    async fn member_loan_summary(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<MemberLoanSummary>;
}

#[derive(Debug, Clone)]
pub struct LoanRequest {
    pub fund_id: Uuid,
    pub borrower_id: Uuid,
    pub principal_amount: Decimal,
    pub requested_start_month: MonthYear,
    pub purpose: Option<String>,
}
