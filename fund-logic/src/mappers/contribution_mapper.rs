use fund_api::{
    domain::{
        ContributionDue, ContributionDueStatus, MonthYear, ReferenceEntityType, Transaction,
        TransactionType,
    },
    FundResult,
};
use fund_db::models::{ContributionDueModel, TransactionModel};

pub struct ContributionMapper;

impl ContributionMapper {
    pub fn due_to_model(due: ContributionDue) -> ContributionDueModel {
        ContributionDueModel {
            id: due.id,
            fund_id: due.fund_id,
            user_id: due.user_id,
            month_year: due.month_year.as_i32(),
            amount_due: due.amount_due,
            amount_paid: due.amount_paid,
            status: due_status_to_model(due.status),
            due_date: due.due_date,
            paid_date: due.paid_date,
            missed_at: due.missed_at,
            version: due.version,
            created_at: due.created_at,
            updated_at: due.updated_at,
        }
    }

    pub fn due_from_model(model: ContributionDueModel) -> FundResult<ContributionDue> {
        Ok(ContributionDue {
            id: model.id,
            fund_id: model.fund_id,
            user_id: model.user_id,
            month_year: MonthYear::from_yyyymm(model.month_year)?,
            amount_due: model.amount_due,
            amount_paid: model.amount_paid,
            status: due_status_from_model(model.status),
            due_date: model.due_date,
            paid_date: model.paid_date,
            missed_at: model.missed_at,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    pub fn transaction_to_model(transaction: Transaction) -> TransactionModel {
        TransactionModel {
            id: transaction.id,
            fund_id: transaction.fund_id,
            user_id: transaction.user_id,
            transaction_type: transaction_type_to_model(transaction.transaction_type),
            amount: transaction.amount,
            idempotency_key: transaction.idempotency_key,
            reference_entity_type: transaction
                .reference_entity_type
                .map(reference_type_to_model),
            reference_entity_id: transaction.reference_entity_id,
            created_at: transaction.created_at,
        }
    }

    pub fn transaction_from_model(model: TransactionModel) -> Transaction {
        Transaction {
            id: model.id,
            fund_id: model.fund_id,
            user_id: model.user_id,
            transaction_type: transaction_type_from_model(model.transaction_type),
            amount: model.amount,
            idempotency_key: model.idempotency_key,
            reference_entity_type: model.reference_entity_type.map(reference_type_from_model),
            reference_entity_id: model.reference_entity_id,
            created_at: model.created_at,
        }
    }
}

pub fn due_status_to_model(
    status: ContributionDueStatus,
) -> fund_db::models::ContributionDueStatus {
    match status {
        ContributionDueStatus::Pending => fund_db::models::ContributionDueStatus::Pending,
        ContributionDueStatus::Partial => fund_db::models::ContributionDueStatus::Partial,
        ContributionDueStatus::Paid => fund_db::models::ContributionDueStatus::Paid,
        ContributionDueStatus::Late => fund_db::models::ContributionDueStatus::Late,
        ContributionDueStatus::Missed => fund_db::models::ContributionDueStatus::Missed,
    }
}

pub fn due_status_from_model(
    status: fund_db::models::ContributionDueStatus,
) -> ContributionDueStatus {
    match status {
        fund_db::models::ContributionDueStatus::Pending => ContributionDueStatus::Pending,
        fund_db::models::ContributionDueStatus::Partial => ContributionDueStatus::Partial,
        fund_db::models::ContributionDueStatus::Paid => ContributionDueStatus::Paid,
        fund_db::models::ContributionDueStatus::Late => ContributionDueStatus::Late,
        fund_db::models::ContributionDueStatus::Missed => ContributionDueStatus::Missed,
    }
}

pub fn transaction_type_to_model(
    transaction_type: TransactionType,
) -> fund_db::models::TransactionType {
    match transaction_type {
        TransactionType::Contribution => fund_db::models::TransactionType::Contribution,
        TransactionType::Disbursement => fund_db::models::TransactionType::Disbursement,
        TransactionType::Repayment => fund_db::models::TransactionType::Repayment,
        TransactionType::InterestIncome => fund_db::models::TransactionType::InterestIncome,
        TransactionType::Penalty => fund_db::models::TransactionType::Penalty,
    }
}

pub fn transaction_type_from_model(
    transaction_type: fund_db::models::TransactionType,
) -> TransactionType {
    match transaction_type {
        fund_db::models::TransactionType::Contribution => TransactionType::Contribution,
        fund_db::models::TransactionType::Disbursement => TransactionType::Disbursement,
        fund_db::models::TransactionType::Repayment => TransactionType::Repayment,
        fund_db::models::TransactionType::InterestIncome => TransactionType::InterestIncome,
        fund_db::models::TransactionType::Penalty => TransactionType::Penalty,
    }
}

pub fn reference_type_to_model(
    reference_type: ReferenceEntityType,
) -> fund_db::models::ReferenceEntityType {
    match reference_type {
        ReferenceEntityType::ContributionDue => fund_db::models::ReferenceEntityType::ContributionDue,
        ReferenceEntityType::Loan => fund_db::models::ReferenceEntityType::Loan,
        ReferenceEntityType::RepaymentEntry => fund_db::models::ReferenceEntityType::RepaymentEntry,
        ReferenceEntityType::DissolutionSettlement => {
            fund_db::models::ReferenceEntityType::DissolutionSettlement
        }
    }
}

pub fn reference_type_from_model(
    reference_type: fund_db::models::ReferenceEntityType,
) -> ReferenceEntityType {
    match reference_type {
        fund_db::models::ReferenceEntityType::ContributionDue => ReferenceEntityType::ContributionDue,
        fund_db::models::ReferenceEntityType::Loan => ReferenceEntityType::Loan,
        fund_db::models::ReferenceEntityType::RepaymentEntry => ReferenceEntityType::RepaymentEntry,
        fund_db::models::ReferenceEntityType::DissolutionSettlement => {
            ReferenceEntityType::DissolutionSettlement
        }
    }
}
