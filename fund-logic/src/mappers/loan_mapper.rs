use fund_api::{
    domain::{Loan, LoanState, LoanStatus, LoanTerms, MonthYear},
    FundError, FundResult,
};
use fund_db::models::LoanModel;

pub struct LoanMapper;

impl LoanMapper {
    pub fn to_model(loan: Loan) -> LoanModel {
        let status = status_to_model(loan.status());
        let (terms, approved_by, approval_date, disbursement_date, rejection, rejected_at, closed) =
            match loan.state {
                LoanState::PendingApproval => (None, None, None, None, None, None, None),
                LoanState::Approved {
                    terms,
                    approved_by,
                    approval_date,
                } => (
                    Some(terms),
                    Some(approved_by),
                    Some(approval_date),
                    None,
                    None,
                    None,
                    None,
                ),
                LoanState::Active {
                    terms,
                    approved_by,
                    approval_date,
                    disbursement_date,
                } => (
                    Some(terms),
                    Some(approved_by),
                    Some(approval_date),
                    Some(disbursement_date),
                    None,
                    None,
                    None,
                ),
                LoanState::Rejected {
                    reason,
                    rejected_at,
                } => (None, None, None, None, Some(reason), Some(rejected_at), None),
                LoanState::Closed {
                    terms,
                    approved_by,
                    approval_date,
                    disbursement_date,
                    closed_date,
                } => (
                    Some(terms),
                    Some(approved_by),
                    Some(approval_date),
                    Some(disbursement_date),
                    None,
                    None,
                    Some(closed_date),
                ),
            };
        LoanModel {
            id: loan.id,
            fund_id: loan.fund_id,
            borrower_id: loan.borrower_id,
            principal_amount: loan.principal_amount,
            requested_start_month: loan.requested_start_month.as_i32(),
            purpose: loan.purpose,
            outstanding_principal: loan.outstanding_principal,
            status,
            monthly_interest_rate: terms.map(|t| t.monthly_interest_rate),
            scheduled_installment: terms.map(|t| t.scheduled_installment),
            minimum_principal: terms.map(|t| t.minimum_principal),
            approved_by,
            approval_date,
            disbursement_date,
            rejection_reason: rejection,
            rejected_at,
            closed_date: closed,
            version: loan.version,
            created_at: loan.created_at,
            updated_at: loan.updated_at,
        }
    }

    pub fn from_model(model: LoanModel) -> FundResult<Loan> {
        let id = model.id;
        let state = match model.status {
            fund_db::models::LoanStatus::PendingApproval => LoanState::PendingApproval,
            fund_db::models::LoanStatus::Approved => LoanState::Approved {
                terms: terms_from_model(&model)?,
                approved_by: model.approved_by.ok_or_else(|| corrupt(id, "approved_by"))?,
                approval_date: model
                    .approval_date
                    .ok_or_else(|| corrupt(id, "approval_date"))?,
            },
            fund_db::models::LoanStatus::Active => LoanState::Active {
                terms: terms_from_model(&model)?,
                approved_by: model.approved_by.ok_or_else(|| corrupt(id, "approved_by"))?,
                approval_date: model
                    .approval_date
                    .ok_or_else(|| corrupt(id, "approval_date"))?,
                disbursement_date: model
                    .disbursement_date
                    .ok_or_else(|| corrupt(id, "disbursement_date"))?,
            },
            fund_db::models::LoanStatus::Rejected => LoanState::Rejected {
                reason: model
                    .rejection_reason
                    .clone()
                    .ok_or_else(|| corrupt(id, "rejection_reason"))?,
                rejected_at: model.rejected_at.ok_or_else(|| corrupt(id, "rejected_at"))?,
            },
            fund_db::models::LoanStatus::Closed => LoanState::Closed {
                terms: terms_from_model(&model)?,
                approved_by: model.approved_by.ok_or_else(|| corrupt(id, "approved_by"))?,
                approval_date: model
                    .approval_date
                    .ok_or_else(|| corrupt(id, "approval_date"))?,
                disbursement_date: model
                    .disbursement_date
                    .ok_or_else(|| corrupt(id, "disbursement_date"))?,
                closed_date: model.closed_date.ok_or_else(|| corrupt(id, "closed_date"))?,
            },
        };
        Ok(Loan {
            id: model.id,
            fund_id: model.fund_id,
            borrower_id: model.borrower_id,
            principal_amount: model.principal_amount,
            requested_start_month: MonthYear::from_yyyymm(model.requested_start_month)?,
            purpose: model.purpose,
            outstanding_principal: model.outstanding_principal,
            state,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn terms_from_model(model: &LoanModel) -> FundResult<LoanTerms> {
    Ok(LoanTerms {
        monthly_interest_rate: model
            .monthly_interest_rate
            .ok_or_else(|| corrupt(model.id, "monthly_interest_rate"))?,
        scheduled_installment: model
            .scheduled_installment
            .ok_or_else(|| corrupt(model.id, "scheduled_installment"))?,
        minimum_principal: model
            .minimum_principal
            .ok_or_else(|| corrupt(model.id, "minimum_principal"))?,
    })
}

fn corrupt(id: uuid::Uuid, column: &str) -> FundError {
    FundError::Internal(format!("loan {id} has status without {column}"))
}

pub fn status_to_model(status: LoanStatus) -> fund_db::models::LoanStatus {
    match status {
        LoanStatus::PendingApproval => fund_db::models::LoanStatus::PendingApproval,
        LoanStatus::Approved => fund_db::models::LoanStatus::Approved,
        LoanStatus::Active => fund_db::models::LoanStatus::Active,
        LoanStatus::Rejected => fund_db::models::LoanStatus::Rejected,
        LoanStatus::Closed => fund_db::models::LoanStatus::Closed,
    }
}

pub fn status_from_model(status: fund_db::models::LoanStatus) -> LoanStatus {
    match status {
        fund_db::models::LoanStatus::PendingApproval => LoanStatus::PendingApproval,
        fund_db::models::LoanStatus::Approved => LoanStatus::Approved,
        fund_db::models::LoanStatus::Active => LoanStatus::Active,
        fund_db::models::LoanStatus::Rejected => LoanStatus::Rejected,
        fund_db::models::LoanStatus::Closed => LoanStatus::Closed,
    }
}
