//! In-memory repository doubles backing the service integration tests.
//! They mirror the contracts of the Postgres implementations: version
//! checks bump the row version, unique keys reject duplicates with
//! `Conflict`, and composite writes land every row of the operation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use fund_api::{
    domain::{AuditEnvelope, Fund, FundConfig, LoanApprovalPolicy, PenaltyType},
    service::{
        AuditSink, ContributionService, CreateFundRequest, FundService, InviteMemberRequest,
    },
    FundError, FundResult,
};
use fund_db::models::*;
use fund_db::repository::*;
use fund_logic::{
    bus::InProcessEventBus, events::EventRecorder, projection::FundProjectionStore,
    ContributionServiceImpl, DissolutionServiceImpl, FundServiceImpl, LoanServiceImpl,
    PenaltyServiceImpl, RepaymentServiceImpl, VotingServiceImpl,
};

#[derive(Default)]
pub struct Database {
    pub funds: Mutex<HashMap<Uuid, FundModel>>,
    pub roles: Mutex<Vec<FundRoleAssignmentModel>>,
    pub plans: Mutex<Vec<MemberContributionPlanModel>>,
    pub invitations: Mutex<Vec<InvitationModel>>,
    pub dues: Mutex<Vec<ContributionDueModel>>,
    pub transactions: Mutex<Vec<TransactionModel>>,
    pub idempotency: Mutex<Vec<IdempotencyRecordModel>>,
    pub loans: Mutex<HashMap<Uuid, LoanModel>>,
    pub entries: Mutex<Vec<RepaymentEntryModel>>,
    pub sessions: Mutex<Vec<VotingSessionModel>>,
    pub votes: Mutex<Vec<VoteModel>>,
    pub settlements: Mutex<Vec<DissolutionSettlementModel>>,
    pub line_items: Mutex<Vec<DissolutionLineItemModel>>,
    pub outbox: Mutex<Vec<OutboxEntryModel>>,
    pub locks: Mutex<HashSet<(String, Uuid)>>,
}

impl Database {
    fn push_outbox(&self, entries: Vec<OutboxEntryModel>) {
        self.outbox.lock().unwrap().extend(entries);
    }

    fn append_transaction(&self, transaction: TransactionModel) -> FundResult<()> {
        let mut transactions = self.transactions.lock().unwrap();
        if transactions.iter().any(|t| {
            t.fund_id == transaction.fund_id && t.idempotency_key == transaction.idempotency_key
        }) {
            return Err(FundError::Conflict(format!(
                "duplicate ledger idempotency key {}",
                transaction.idempotency_key
            )));
        }
        transactions.push(transaction);
        Ok(())
    }
}

pub struct MockFundRepository {
    db: Arc<Database>,
}

#[async_trait]
impl FundRepository for MockFundRepository {
    async fn create(
        &self,
        fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundModel> {
        self.db.funds.lock().unwrap().insert(fund.id, fund.clone());
        self.db.push_outbox(outbox);
        Ok(fund)
    }

    async fn update(
        &self,
        mut fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundModel> {
        {
            let mut funds = self.db.funds.lock().unwrap();
            let current = funds
                .get(&fund.id)
                .ok_or_else(|| FundError::not_found("Fund", fund.id))?;
            if current.version != fund.version {
                return Err(FundError::version_conflict("Fund", fund.id, fund.version));
            }
            fund.version += 1;
            funds.insert(fund.id, fund.clone());
        }
        self.db.push_outbox(outbox);
        Ok(fund)
    }

    async fn find_by_id(&self, fund_id: Uuid) -> FundResult<Option<FundModel>> {
        Ok(self.db.funds.lock().unwrap().get(&fund_id).cloned())
    }

    async fn exists(&self, fund_id: Uuid) -> FundResult<bool> {
        Ok(self.db.funds.lock().unwrap().contains_key(&fund_id))
    }
}

pub struct MockMembershipRepository {
    db: Arc<Database>,
}

#[async_trait]
impl MembershipRepository for MockMembershipRepository {
    async fn create_role_assignment(
        &self,
        assignment: FundRoleAssignmentModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundRoleAssignmentModel> {
        {
            let mut roles = self.db.roles.lock().unwrap();
            if roles
                .iter()
                .any(|r| r.fund_id == assignment.fund_id && r.user_id == assignment.user_id)
            {
                return Err(FundError::Conflict("duplicate role assignment".to_string()));
            }
            roles.push(assignment.clone());
        }
        self.db.push_outbox(outbox);
        Ok(assignment)
    }

    async fn find_role_assignment(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Option<FundRoleAssignmentModel>> {
        Ok(self
            .db
            .roles
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.fund_id == fund_id && r.user_id == user_id)
            .cloned())
    }

    async fn find_role_assignments_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<FundRoleAssignmentModel>> {
        Ok(self
            .db
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.fund_id == fund_id)
            .cloned()
            .collect())
    }

    async fn update_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundRoleAssignmentModel> {
        let updated = {
            let mut roles = self.db.roles.lock().unwrap();
            let assignment = roles
                .iter_mut()
                .find(|r| r.fund_id == fund_id && r.user_id == user_id)
                .ok_or_else(|| FundError::not_found("FundRoleAssignment", user_id))?;
            assignment.role = role;
            assignment.updated_at = Utc::now();
            assignment.clone()
        };
        self.db.push_outbox(outbox);
        Ok(updated)
    }

    async fn count_admins(&self, fund_id: Uuid) -> FundResult<i64> {
        Ok(self
            .db
            .roles
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.fund_id == fund_id && r.role == FundRole::Admin)
            .count() as i64)
    }

    async fn create_member_plan(
        &self,
        plan: MemberContributionPlanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<MemberContributionPlanModel> {
        {
            let mut plans = self.db.plans.lock().unwrap();
            if plans
                .iter()
                .any(|p| p.fund_id == plan.fund_id && p.user_id == plan.user_id)
            {
                return Err(FundError::Conflict("duplicate member plan".to_string()));
            }
            plans.push(plan.clone());
        }
        self.db.push_outbox(outbox);
        Ok(plan)
    }

    async fn find_member_plan(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Option<MemberContributionPlanModel>> {
        Ok(self
            .db
            .plans
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.fund_id == fund_id && p.user_id == user_id)
            .cloned())
    }

    async fn find_active_plans_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<MemberContributionPlanModel>> {
        Ok(self
            .db
            .plans
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.fund_id == fund_id && p.is_active)
            .cloned()
            .collect())
    }

    async fn remove_member(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<()> {
        self.db
            .roles
            .lock()
            .unwrap()
            .retain(|r| !(r.fund_id == fund_id && r.user_id == user_id));
        if let Some(plan) = self
            .db
            .plans
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.fund_id == fund_id && p.user_id == user_id)
        {
            plan.is_active = false;
        }
        self.db.push_outbox(outbox);
        Ok(())
    }
}

pub struct MockInvitationRepository {
    db: Arc<Database>,
}

#[async_trait]
impl InvitationRepository for MockInvitationRepository {
    async fn create(
        &self,
        invitation: InvitationModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<InvitationModel> {
        self.db.invitations.lock().unwrap().push(invitation.clone());
        self.db.push_outbox(outbox);
        Ok(invitation)
    }

    async fn find_by_id(&self, invitation_id: Uuid) -> FundResult<Option<InvitationModel>> {
        Ok(self
            .db
            .invitations
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == invitation_id)
            .cloned())
    }

    async fn find_pending(
        &self,
        fund_id: Uuid,
        target_contact: &str,
    ) -> FundResult<Option<InvitationModel>> {
        Ok(self
            .db
            .invitations
            .lock()
            .unwrap()
            .iter()
            .find(|i| {
                i.fund_id == fund_id
                    && i.target_contact.as_str() == target_contact
                    && i.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn update(&self, invitation: InvitationModel) -> FundResult<InvitationModel> {
        let mut invitations = self.db.invitations.lock().unwrap();
        let stored = invitations
            .iter_mut()
            .find(|i| i.id == invitation.id)
            .ok_or_else(|| FundError::not_found("Invitation", invitation.id))?;
        *stored = invitation.clone();
        Ok(invitation)
    }

    async fn accept(
        &self,
        invitation: InvitationModel,
        plan: MemberContributionPlanModel,
        role: FundRoleAssignmentModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<MemberContributionPlanModel> {
        {
            let mut invitations = self.db.invitations.lock().unwrap();
            let stored = invitations
                .iter_mut()
                .find(|i| i.id == invitation.id)
                .ok_or_else(|| FundError::not_found("Invitation", invitation.id))?;
            *stored = invitation.clone();
        }
        {
            let mut plans = self.db.plans.lock().unwrap();
            if plans
                .iter()
                .any(|p| p.fund_id == plan.fund_id && p.user_id == plan.user_id)
            {
                return Err(FundError::Conflict("duplicate member plan".to_string()));
            }
            plans.push(plan.clone());
        }
        self.db.roles.lock().unwrap().push(role);
        self.db.push_outbox(outbox);
        Ok(plan)
    }

    async fn find_expired_pending(
        &self,
        fund_id: Uuid,
        now: DateTime<Utc>,
    ) -> FundResult<Vec<InvitationModel>> {
        Ok(self
            .db
            .invitations
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                i.fund_id == fund_id && i.status == InvitationStatus::Pending && i.expires_at < now
            })
            .cloned()
            .collect())
    }
}

pub struct MockContributionDueRepository {
    db: Arc<Database>,
}

impl MockContributionDueRepository {
    fn apply_update(&self, due: &ContributionDueModel) -> FundResult<ContributionDueModel> {
        let mut dues = self.db.dues.lock().unwrap();
        let stored = dues
            .iter_mut()
            .find(|d| d.id == due.id)
            .ok_or_else(|| FundError::not_found("ContributionDue", due.id))?;
        if stored.version != due.version {
            return Err(FundError::version_conflict(
                "ContributionDue",
                due.id,
                due.version,
            ));
        }
        let mut updated = due.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl ContributionDueRepository for MockContributionDueRepository {
    async fn create(&self, due: ContributionDueModel) -> FundResult<ContributionDueModel> {
        let mut dues = self.db.dues.lock().unwrap();
        if dues.iter().any(|d| {
            d.fund_id == due.fund_id && d.user_id == due.user_id && d.month_year == due.month_year
        }) {
            return Err(FundError::Conflict("duplicate contribution due".to_string()));
        }
        dues.push(due.clone());
        Ok(due)
    }

    async fn exists(&self, fund_id: Uuid, user_id: Uuid, month_year: i32) -> FundResult<bool> {
        Ok(self.db.dues.lock().unwrap().iter().any(|d| {
            d.fund_id == fund_id && d.user_id == user_id && d.month_year == month_year
        }))
    }

    async fn find_by_id(&self, due_id: Uuid) -> FundResult<Option<ContributionDueModel>> {
        Ok(self
            .db
            .dues
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == due_id)
            .cloned())
    }

    async fn find_by_fund_month(
        &self,
        fund_id: Uuid,
        month_year: i32,
    ) -> FundResult<Vec<ContributionDueModel>> {
        Ok(self
            .db
            .dues
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.fund_id == fund_id && d.month_year == month_year)
            .cloned()
            .collect())
    }

    async fn find_unsettled_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<ContributionDueModel>> {
        Ok(self
            .db
            .dues
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.fund_id == fund_id
                    && d.status != ContributionDueStatus::Paid
                    && d.amount_paid < d.amount_due
            })
            .cloned()
            .collect())
    }

    async fn find_unsettled_by_user(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Vec<ContributionDueModel>> {
        Ok(self
            .db
            .dues
            .lock()
            .unwrap()
            .iter()
            .filter(|d| {
                d.fund_id == fund_id
                    && d.user_id == user_id
                    && d.status != ContributionDueStatus::Paid
                    && d.amount_paid < d.amount_due
            })
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        due: ContributionDueModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<ContributionDueModel> {
        let updated = self.apply_update(&due)?;
        self.db.push_outbox(outbox);
        Ok(updated)
    }

    async fn record_payment(
        &self,
        due: ContributionDueModel,
        transaction: TransactionModel,
        idempotency: IdempotencyRecordModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<ContributionDueModel> {
        let updated = self.apply_update(&due)?;
        self.db.append_transaction(transaction)?;
        self.db.idempotency.lock().unwrap().push(idempotency);
        self.db.push_outbox(outbox);
        Ok(updated)
    }
}

pub struct MockTransactionRepository {
    db: Arc<Database>,
}

#[async_trait]
impl TransactionRepository for MockTransactionRepository {
    async fn append(&self, transaction: TransactionModel) -> FundResult<TransactionModel> {
        self.db.append_transaction(transaction.clone())?;
        Ok(transaction)
    }

    async fn find_by_fund(
        &self,
        fund_id: Uuid,
        transaction_type: Option<TransactionType>,
        user_id: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> FundResult<Vec<TransactionModel>> {
        Ok(self
            .db
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.fund_id == fund_id)
            .filter(|t| transaction_type.map_or(true, |tt| t.transaction_type == tt))
            .filter(|t| user_id.map_or(true, |u| t.user_id == Some(u)))
            .filter(|t| from.map_or(true, |f| t.created_at >= f))
            .filter(|t| to.map_or(true, |u| t.created_at <= u))
            .cloned()
            .collect())
    }

    async fn sum_by_type(
        &self,
        fund_id: Uuid,
        transaction_type: TransactionType,
    ) -> FundResult<Decimal> {
        Ok(self
            .db
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.fund_id == fund_id && t.transaction_type == transaction_type)
            .map(|t| t.amount)
            .sum())
    }

    async fn sum_by_type_for_user(
        &self,
        fund_id: Uuid,
        transaction_type: TransactionType,
        user_id: Uuid,
    ) -> FundResult<Decimal> {
        Ok(self
            .db
            .transactions
            .lock()
            .unwrap()
            .iter()
            .filter(|t| {
                t.fund_id == fund_id
                    && t.transaction_type == transaction_type
                    && t.user_id == Some(user_id)
            })
            .map(|t| t.amount)
            .sum())
    }

    async fn exists_by_key(&self, fund_id: Uuid, idempotency_key: &str) -> FundResult<bool> {
        Ok(self
            .db
            .transactions
            .lock()
            .unwrap()
            .iter()
            .any(|t| t.fund_id == fund_id && t.idempotency_key.as_str() == idempotency_key))
    }
}

pub struct MockIdempotencyRepository {
    db: Arc<Database>,
}

#[async_trait]
impl IdempotencyRepository for MockIdempotencyRepository {
    async fn find(
        &self,
        fund_id: Uuid,
        endpoint: &str,
        idempotency_key: &str,
    ) -> FundResult<Option<IdempotencyRecordModel>> {
        Ok(self
            .db
            .idempotency
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.fund_id == fund_id
                    && r.endpoint.as_str() == endpoint
                    && r.idempotency_key.as_str() == idempotency_key
            })
            .cloned())
    }

    async fn create(&self, record: IdempotencyRecordModel) -> FundResult<IdempotencyRecordModel> {
        self.db.idempotency.lock().unwrap().push(record.clone());
        Ok(record)
    }
}

pub struct MockLoanRepository {
    db: Arc<Database>,
}

impl MockLoanRepository {
    fn apply_update(&self, loan: &LoanModel) -> FundResult<LoanModel> {
        let mut loans = self.db.loans.lock().unwrap();
        let stored = loans
            .get(&loan.id)
            .ok_or_else(|| FundError::not_found("Loan", loan.id))?;
        if stored.version != loan.version {
            return Err(FundError::version_conflict("Loan", loan.id, loan.version));
        }
        let mut updated = loan.clone();
        updated.version += 1;
        loans.insert(loan.id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl LoanRepository for MockLoanRepository {
    async fn create(
        &self,
        loan: LoanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel> {
        self.db.loans.lock().unwrap().insert(loan.id, loan.clone());
        self.db.push_outbox(outbox);
        Ok(loan)
    }

    async fn update(
        &self,
        loan: LoanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel> {
        let updated = self.apply_update(&loan)?;
        self.db.push_outbox(outbox);
        Ok(updated)
    }

    async fn approve_and_disburse(
        &self,
        loan: LoanModel,
        disbursement: TransactionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel> {
        let updated = self.apply_update(&loan)?;
        self.db.append_transaction(disbursement)?;
        self.db.push_outbox(outbox);
        Ok(updated)
    }

    async fn find_by_id(&self, loan_id: Uuid) -> FundResult<Option<LoanModel>> {
        Ok(self.db.loans.lock().unwrap().get(&loan_id).cloned())
    }

    async fn find_by_borrower(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<Vec<LoanModel>> {
        Ok(self
            .db
            .loans
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.fund_id == fund_id && l.borrower_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_open_by_borrower(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<i64> {
        Ok(self
            .db
            .loans
            .lock()
            .unwrap()
            .values()
            .filter(|l| {
                l.fund_id == fund_id
                    && l.borrower_id == user_id
                    && matches!(
                        l.status,
                        LoanStatus::PendingApproval | LoanStatus::Approved | LoanStatus::Active
                    )
            })
            .count() as i64)
    }

    async fn find_open_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<LoanModel>> {
        Ok(self
            .db
            .loans
            .lock()
            .unwrap()
            .values()
            .filter(|l| {
                l.fund_id == fund_id
                    && matches!(
                        l.status,
                        LoanStatus::PendingApproval | LoanStatus::Approved | LoanStatus::Active
                    )
            })
            .cloned()
            .collect())
    }
}

pub struct MockRepaymentRepository {
    db: Arc<Database>,
}

impl MockRepaymentRepository {
    fn apply_update(&self, entry: &RepaymentEntryModel) -> FundResult<RepaymentEntryModel> {
        let mut entries = self.db.entries.lock().unwrap();
        let stored = entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| FundError::not_found("RepaymentEntry", entry.id))?;
        if stored.version != entry.version {
            return Err(FundError::version_conflict(
                "RepaymentEntry",
                entry.id,
                entry.version,
            ));
        }
        let mut updated = entry.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    fn apply_loan_update(&self, loan: &LoanModel) -> FundResult<()> {
        let mut loans = self.db.loans.lock().unwrap();
        let stored = loans
            .get(&loan.id)
            .ok_or_else(|| FundError::not_found("Loan", loan.id))?;
        if stored.version != loan.version {
            return Err(FundError::version_conflict("Loan", loan.id, loan.version));
        }
        let mut updated = loan.clone();
        updated.version += 1;
        loans.insert(loan.id, updated);
        Ok(())
    }
}

#[async_trait]
impl RepaymentRepository for MockRepaymentRepository {
    async fn create(
        &self,
        entry: RepaymentEntryModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel> {
        {
            let mut entries = self.db.entries.lock().unwrap();
            if entries
                .iter()
                .any(|e| e.loan_id == entry.loan_id && e.month_year == entry.month_year)
            {
                return Err(FundError::Conflict("duplicate repayment entry".to_string()));
            }
            entries.push(entry.clone());
        }
        self.db.push_outbox(outbox);
        Ok(entry)
    }

    async fn find_by_id(&self, entry_id: Uuid) -> FundResult<Option<RepaymentEntryModel>> {
        Ok(self
            .db
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == entry_id)
            .cloned())
    }

    async fn find_by_loan_month(
        &self,
        loan_id: Uuid,
        month_year: i32,
    ) -> FundResult<Option<RepaymentEntryModel>> {
        Ok(self
            .db
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.loan_id == loan_id && e.month_year == month_year)
            .cloned())
    }

    async fn find_by_loan(&self, loan_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>> {
        Ok(self
            .db
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.loan_id == loan_id)
            .cloned()
            .collect())
    }

    async fn find_open_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>> {
        Ok(self
            .db
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.fund_id == fund_id
                    && matches!(e.status, RepaymentStatus::Pending | RepaymentStatus::Partial)
            })
            .cloned()
            .collect())
    }

    async fn find_overdue_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>> {
        Ok(self
            .db
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.fund_id == fund_id
                    && e.status == RepaymentStatus::Overdue
                    && e.amount_paid < e.interest_due + e.principal_due + e.penalty_accrued
            })
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        entry: RepaymentEntryModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel> {
        let updated = self.apply_update(&entry)?;
        self.db.push_outbox(outbox);
        Ok(updated)
    }

    async fn record_payment(
        &self,
        entry: RepaymentEntryModel,
        loan: LoanModel,
        cash_transaction: TransactionModel,
        interest_transaction: Option<TransactionModel>,
        idempotency: IdempotencyRecordModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel> {
        let updated = self.apply_update(&entry)?;
        self.apply_loan_update(&loan)?;
        self.db.append_transaction(cash_transaction)?;
        if let Some(interest) = interest_transaction {
            self.db.append_transaction(interest)?;
        }
        self.db.idempotency.lock().unwrap().push(idempotency);
        self.db.push_outbox(outbox);
        Ok(updated)
    }
}

pub struct MockVotingRepository {
    db: Arc<Database>,
}

#[async_trait]
impl VotingRepository for MockVotingRepository {
    async fn create_session(
        &self,
        session: VotingSessionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VotingSessionModel> {
        {
            let mut sessions = self.db.sessions.lock().unwrap();
            if sessions.iter().any(|s| s.loan_id == session.loan_id) {
                return Err(FundError::Conflict(format!(
                    "voting session already exists for loan {}",
                    session.loan_id
                )));
            }
            sessions.push(session.clone());
        }
        self.db.push_outbox(outbox);
        Ok(session)
    }

    async fn update_session(
        &self,
        session: VotingSessionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VotingSessionModel> {
        {
            let mut sessions = self.db.sessions.lock().unwrap();
            let stored = sessions
                .iter_mut()
                .find(|s| s.id == session.id)
                .ok_or_else(|| FundError::not_found("VotingSession", session.id))?;
            *stored = session.clone();
        }
        self.db.push_outbox(outbox);
        Ok(session)
    }

    async fn find_session_by_id(
        &self,
        session_id: Uuid,
    ) -> FundResult<Option<VotingSessionModel>> {
        Ok(self
            .db
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id)
            .cloned())
    }

    async fn find_session_by_loan(
        &self,
        loan_id: Uuid,
    ) -> FundResult<Option<VotingSessionModel>> {
        Ok(self
            .db
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.loan_id == loan_id)
            .cloned())
    }

    async fn create_vote(
        &self,
        vote: VoteModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VoteModel> {
        {
            let mut votes = self.db.votes.lock().unwrap();
            if votes
                .iter()
                .any(|v| v.session_id == vote.session_id && v.voter_id == vote.voter_id)
            {
                return Err(FundError::AlreadyVoted {
                    session_id: vote.session_id,
                    voter_id: vote.voter_id,
                });
            }
            votes.push(vote.clone());
        }
        self.db.push_outbox(outbox);
        Ok(vote)
    }

    async fn find_vote(&self, session_id: Uuid, voter_id: Uuid) -> FundResult<Option<VoteModel>> {
        Ok(self
            .db
            .votes
            .lock()
            .unwrap()
            .iter()
            .find(|v| v.session_id == session_id && v.voter_id == voter_id)
            .cloned())
    }

    async fn find_votes_by_session(&self, session_id: Uuid) -> FundResult<Vec<VoteModel>> {
        Ok(self
            .db
            .votes
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn count_votes(&self, session_id: Uuid) -> FundResult<(i64, i64)> {
        let votes = self.db.votes.lock().unwrap();
        let approve = votes
            .iter()
            .filter(|v| v.session_id == session_id && v.decision == VoteDecision::Approve)
            .count() as i64;
        let reject = votes
            .iter()
            .filter(|v| v.session_id == session_id && v.decision == VoteDecision::Reject)
            .count() as i64;
        Ok((approve, reject))
    }
}

pub struct MockSettlementRepository {
    db: Arc<Database>,
}

#[async_trait]
impl SettlementRepository for MockSettlementRepository {
    async fn save(
        &self,
        settlement: DissolutionSettlementModel,
        line_items: Vec<DissolutionLineItemModel>,
    ) -> FundResult<DissolutionSettlementModel> {
        let mut settlements = self.db.settlements.lock().unwrap();
        let result = match settlements
            .iter_mut()
            .find(|s| s.fund_id == settlement.fund_id)
        {
            Some(stored) => {
                let mut updated = settlement.clone();
                updated.version = stored.version + 1;
                *stored = updated.clone();
                updated
            }
            None => {
                settlements.push(settlement.clone());
                settlement
            }
        };
        let mut items = self.db.line_items.lock().unwrap();
        items.retain(|i| i.settlement_id != result.id);
        items.extend(line_items);
        Ok(result)
    }

    async fn find_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Option<(DissolutionSettlementModel, Vec<DissolutionLineItemModel>)>> {
        let settlements = self.db.settlements.lock().unwrap();
        let Some(settlement) = settlements.iter().find(|s| s.fund_id == fund_id).cloned() else {
            return Ok(None);
        };
        let items = self
            .db
            .line_items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.settlement_id == settlement.id)
            .cloned()
            .collect();
        Ok(Some((settlement, items)))
    }

    async fn confirm(
        &self,
        settlement: DissolutionSettlementModel,
        fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<DissolutionSettlementModel> {
        let result = {
            let mut settlements = self.db.settlements.lock().unwrap();
            let stored = settlements
                .iter_mut()
                .find(|s| s.id == settlement.id)
                .ok_or_else(|| FundError::not_found("DissolutionSettlement", settlement.id))?;
            if stored.version != settlement.version {
                return Err(FundError::version_conflict(
                    "DissolutionSettlement",
                    settlement.id,
                    settlement.version,
                ));
            }
            let mut updated = settlement.clone();
            updated.version += 1;
            *stored = updated.clone();
            updated
        };
        {
            let mut funds = self.db.funds.lock().unwrap();
            let stored = funds
                .get(&fund.id)
                .ok_or_else(|| FundError::not_found("Fund", fund.id))?;
            if stored.version != fund.version {
                return Err(FundError::version_conflict("Fund", fund.id, fund.version));
            }
            let mut updated = fund.clone();
            updated.version += 1;
            funds.insert(fund.id, updated);
        }
        self.db.push_outbox(outbox);
        Ok(result)
    }
}

pub struct MockOutboxRepository {
    db: Arc<Database>,
}

#[async_trait]
impl OutboxRepository for MockOutboxRepository {
    async fn enqueue(&self, entry: OutboxEntryModel) -> FundResult<OutboxEntryModel> {
        self.db.outbox.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> FundResult<Vec<OutboxEntryModel>> {
        Ok(self
            .db
            .outbox
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.published_at.is_none() && e.next_attempt_at <= now)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, entry_id: Uuid, published_at: DateTime<Utc>) -> FundResult<()> {
        if let Some(entry) = self
            .db
            .outbox
            .lock()
            .unwrap()
            .iter_mut()
            .find(|e| e.id == entry_id)
        {
            entry.published_at = Some(published_at);
        }
        Ok(())
    }

    async fn reschedule(
        &self,
        entry_id: Uuid,
        attempts: i32,
        next_attempt_at: DateTime<Utc>,
    ) -> FundResult<()> {
        if let Some(entry) = self
            .db
            .outbox
            .lock()
            .unwrap()
            .iter_mut()
            .find(|e| e.id == entry_id)
        {
            entry.attempts = attempts;
            entry.next_attempt_at = next_attempt_at;
        }
        Ok(())
    }
}

pub struct MockJobLockRepository {
    db: Arc<Database>,
}

#[async_trait]
impl JobLockRepository for MockJobLockRepository {
    async fn try_acquire(&self, job_name: &str, fund_id: Uuid) -> FundResult<bool> {
        Ok(self
            .db
            .locks
            .lock()
            .unwrap()
            .insert((job_name.to_string(), fund_id)))
    }

    async fn release(&self, job_name: &str, fund_id: Uuid) -> FundResult<()> {
        self.db
            .locks
            .lock()
            .unwrap()
            .remove(&(job_name.to_string(), fund_id));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAuditSink {
    pub envelopes: Mutex<Vec<AuditEnvelope>>,
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn record(&self, envelope: AuditEnvelope) -> FundResult<()> {
        self.envelopes.lock().unwrap().push(envelope);
        Ok(())
    }
}

pub struct TestHarness {
    pub db: Arc<Database>,
    pub audit_sink: Arc<MockAuditSink>,
    pub projections: Arc<FundProjectionStore>,
    pub fund_service: FundServiceImpl,
    pub contribution_service: ContributionServiceImpl,
    pub loan_service: LoanServiceImpl,
    pub repayment_service: RepaymentServiceImpl,
    pub voting_service: VotingServiceImpl,
    pub penalty_service: PenaltyServiceImpl,
    pub dissolution_service: DissolutionServiceImpl,
}

pub async fn harness() -> TestHarness {
    let db = Arc::new(Database::default());
    let bus = Arc::new(InProcessEventBus::new());
    let projections = Arc::new(FundProjectionStore::new());
    bus.subscribe(projections.clone()).await;

    let fund_repository = Arc::new(MockFundRepository { db: db.clone() });
    let membership_repository = Arc::new(MockMembershipRepository { db: db.clone() });
    let invitation_repository = Arc::new(MockInvitationRepository { db: db.clone() });
    let due_repository = Arc::new(MockContributionDueRepository { db: db.clone() });
    let transaction_repository = Arc::new(MockTransactionRepository { db: db.clone() });
    let idempotency_repository = Arc::new(MockIdempotencyRepository { db: db.clone() });
    let loan_repository = Arc::new(MockLoanRepository { db: db.clone() });
    let repayment_repository = Arc::new(MockRepaymentRepository { db: db.clone() });
    let voting_repository = Arc::new(MockVotingRepository { db: db.clone() });
    let settlement_repository = Arc::new(MockSettlementRepository { db: db.clone() });
    let outbox_repository = Arc::new(MockOutboxRepository { db: db.clone() });
    let job_lock_repository = Arc::new(MockJobLockRepository { db: db.clone() });
    let audit_sink = Arc::new(MockAuditSink::default());

    let events = EventRecorder::new(outbox_repository.clone(), bus.clone());

    TestHarness {
        db,
        audit_sink: audit_sink.clone(),
        projections: projections.clone(),
        fund_service: FundServiceImpl::new(
            fund_repository.clone(),
            membership_repository.clone(),
            invitation_repository.clone(),
            loan_repository.clone(),
            transaction_repository.clone(),
            events.clone(),
            audit_sink.clone(),
        ),
        contribution_service: ContributionServiceImpl::new(
            fund_repository.clone(),
            membership_repository.clone(),
            due_repository.clone(),
            transaction_repository.clone(),
            idempotency_repository.clone(),
            job_lock_repository.clone(),
            events.clone(),
            audit_sink.clone(),
        ),
        loan_service: LoanServiceImpl::new(
            loan_repository.clone(),
            projections.clone(),
            events.clone(),
            audit_sink.clone(),
        ),
        repayment_service: RepaymentServiceImpl::new(
            loan_repository.clone(),
            repayment_repository.clone(),
            idempotency_repository.clone(),
            job_lock_repository.clone(),
            events.clone(),
            audit_sink.clone(),
        ),
        voting_service: VotingServiceImpl::new(
            voting_repository.clone(),
            loan_repository.clone(),
            events.clone(),
            audit_sink.clone(),
        ),
        penalty_service: PenaltyServiceImpl::new(
            fund_repository.clone(),
            repayment_repository.clone(),
            job_lock_repository.clone(),
            events.clone(),
            audit_sink.clone(),
        ),
        dissolution_service: DissolutionServiceImpl::new(
            fund_repository,
            membership_repository,
            loan_repository,
            repayment_repository,
            due_repository,
            transaction_repository,
            settlement_repository,
            events,
            audit_sink,
        ),
    }
}

pub fn default_config() -> FundConfig {
    FundConfig {
        monthly_interest_rate: Decimal::new(200, 4), // 0.0200
        minimum_monthly_contribution: Decimal::new(10000, 2),
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

/// Create a fund, give `admin` the Admin role, activate it, and enrol each
/// member through the invitation flow with the given plan amount.
pub async fn setup_active_fund(
    harness: &TestHarness,
    config: FundConfig,
    admin: Uuid,
    members: &[(Uuid, Decimal)],
) -> Fund {
    let fund = harness
        .fund_service
        .create_fund(
            CreateFundRequest {
                name: "Neighbourhood Fund".to_string(),
                description: None,
                currency: "USD".to_string(),
                config,
            },
            admin,
        )
        .await
        .unwrap();
    harness
        .fund_service
        .assign_role(fund.id, admin, fund_api::domain::FundRole::Admin, admin)
        .await
        .unwrap();
    let fund = harness
        .fund_service
        .activate_fund(fund.id, admin, fund.version)
        .await
        .unwrap();

    for (index, (user_id, amount)) in members.iter().enumerate() {
        let invitation = harness
            .fund_service
            .invite_member(InviteMemberRequest {
                fund_id: fund.id,
                target_contact: format!("member-{index}@example.org"),
                invited_by: admin,
                ttl_days: None,
            })
            .await
            .unwrap();
        harness
            .fund_service
            .accept_invitation(invitation.id, *user_id, *amount)
            .await
            .unwrap();
    }

    fund
}

/// Outbox repository over an existing database, for dispatcher tests.
pub fn outbox_repository(db: &Arc<Database>) -> Arc<MockOutboxRepository> {
    Arc::new(MockOutboxRepository { db: db.clone() })
}

/// Pool balance recomputed from the ledger, for invariant checks.
pub async fn ledger_balance(harness: &TestHarness, fund_id: Uuid) -> Decimal {
    harness
        .contribution_service
        .fund_balance(fund_id)
        .await
        .unwrap()
}
