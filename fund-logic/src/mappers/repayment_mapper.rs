use fund_api::{
    domain::{MonthYear, RepaymentEntry, RepaymentStatus},
    FundResult,
};
use fund_db::models::RepaymentEntryModel;

pub struct RepaymentMapper;

impl RepaymentMapper {
    pub fn to_model(entry: RepaymentEntry) -> RepaymentEntryModel {
        RepaymentEntryModel {
            id: entry.id,
            loan_id: entry.loan_id,
            fund_id: entry.fund_id,
            month_year: entry.month_year.as_i32(),
            interest_due: entry.interest_due,
            principal_due: entry.principal_due,
            penalty_accrued: entry.penalty_accrued,
            amount_paid: entry.amount_paid,
            status: status_to_model(entry.status),
            due_date: entry.due_date,
            paid_date: entry.paid_date,
            penalty_applied_for: entry.penalty_applied_for,
            version: entry.version,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }

    pub fn from_model(model: RepaymentEntryModel) -> FundResult<RepaymentEntry> {
        Ok(RepaymentEntry {
            id: model.id,
            loan_id: model.loan_id,
            fund_id: model.fund_id,
            month_year: MonthYear::from_yyyymm(model.month_year)?,
            interest_due: model.interest_due,
            principal_due: model.principal_due,
            penalty_accrued: model.penalty_accrued,
            amount_paid: model.amount_paid,
            status: status_from_model(model.status),
            due_date: model.due_date,
            paid_date: model.paid_date,
            penalty_applied_for: model.penalty_applied_for,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

pub fn status_to_model(status: RepaymentStatus) -> fund_db::models::RepaymentStatus {
    match status {
        RepaymentStatus::Pending => fund_db::models::RepaymentStatus::Pending,
        RepaymentStatus::Partial => fund_db::models::RepaymentStatus::Partial,
        RepaymentStatus::Paid => fund_db::models::RepaymentStatus::Paid,
        RepaymentStatus::Overdue => fund_db::models::RepaymentStatus::Overdue,
    }
}

pub fn status_from_model(status: fund_db::models::RepaymentStatus) -> RepaymentStatus {
    match status {
        fund_db::models::RepaymentStatus::Pending => RepaymentStatus::Pending,
        fund_db::models::RepaymentStatus::Partial => RepaymentStatus::Partial,
        fund_db::models::RepaymentStatus::Paid => RepaymentStatus::Paid,
        fund_db::models::RepaymentStatus::Overdue => RepaymentStatus::Overdue,
    }
}
