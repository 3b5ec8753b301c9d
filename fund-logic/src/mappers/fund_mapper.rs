use fund_api::{
    domain::{Fund, FundConfig, FundLifecycle},
    FundError, FundResult,
};
use fund_db::models::FundModel;

pub struct FundMapper;

impl FundMapper {
    pub fn to_model(fund: Fund) -> FundModel {
        let (activated_at, dissolution_initiated_at, dissolved_at) = match fund.lifecycle {
            FundLifecycle::Draft => (None, None, None),
            FundLifecycle::Active { activated_at } => (Some(activated_at), None, None),
            FundLifecycle::Dissolving {
                activated_at,
                initiated_at,
            } => (Some(activated_at), Some(initiated_at), None),
            FundLifecycle::Dissolved {
                activated_at,
                initiated_at,
                dissolved_at,
            } => (Some(activated_at), Some(initiated_at), Some(dissolved_at)),
        };
        FundModel {
            id: fund.id,
            name: fund.name,
            description: fund.description,
            currency: fund.currency,
            monthly_interest_rate: fund.config.monthly_interest_rate,
            minimum_monthly_contribution: fund.config.minimum_monthly_contribution,
            minimum_principal_per_repayment: fund.config.minimum_principal_per_repayment,
            loan_approval_policy: policy_to_model(fund.config.loan_approval_policy),
            max_loan_per_member: fund.config.max_loan_per_member,
            max_concurrent_loans: fund.config.max_concurrent_loans,
            overdue_penalty_type: penalty_to_model(fund.config.overdue_penalty_type),
            overdue_penalty_value: fund.config.overdue_penalty_value,
            contribution_day_of_month: fund.config.contribution_day_of_month as i32,
            grace_period_days: fund.config.grace_period_days,
            missed_after_days: fund.config.missed_after_days,
            status: status_to_model(fund.lifecycle.status()),
            activated_at,
            dissolution_initiated_at,
            dissolved_at,
            version: fund.version,
            created_at: fund.created_at,
            updated_at: fund.updated_at,
        }
    }

    pub fn from_model(model: FundModel) -> FundResult<Fund> {
        let lifecycle = match model.status {
            fund_db::models::FundStatus::Draft => FundLifecycle::Draft,
            fund_db::models::FundStatus::Active => FundLifecycle::Active {
                activated_at: model
                    .activated_at
                    .ok_or_else(|| corrupt_row(model.id, "activated_at"))?,
            },
            fund_db::models::FundStatus::Dissolving => FundLifecycle::Dissolving {
                activated_at: model
                    .activated_at
                    .ok_or_else(|| corrupt_row(model.id, "activated_at"))?,
                initiated_at: model
                    .dissolution_initiated_at
                    .ok_or_else(|| corrupt_row(model.id, "dissolution_initiated_at"))?,
            },
            fund_db::models::FundStatus::Dissolved => FundLifecycle::Dissolved {
                activated_at: model
                    .activated_at
                    .ok_or_else(|| corrupt_row(model.id, "activated_at"))?,
                initiated_at: model
                    .dissolution_initiated_at
                    .ok_or_else(|| corrupt_row(model.id, "dissolution_initiated_at"))?,
                dissolved_at: model
                    .dissolved_at
                    .ok_or_else(|| corrupt_row(model.id, "dissolved_at"))?,
            },
        };
        Ok(Fund {
            id: model.id,
            name: model.name,
            description: model.description,
            currency: model.currency,
            config: FundConfig {
                monthly_interest_rate: model.monthly_interest_rate,
                minimum_monthly_contribution: model.minimum_monthly_contribution,
                minimum_principal_per_repayment: model.minimum_principal_per_repayment,
                loan_approval_policy: policy_from_model(model.loan_approval_policy),
                max_loan_per_member: model.max_loan_per_member,
                max_concurrent_loans: model.max_concurrent_loans,
                overdue_penalty_type: penalty_from_model(model.overdue_penalty_type),
                overdue_penalty_value: model.overdue_penalty_value,
                contribution_day_of_month: model.contribution_day_of_month as u32,
                grace_period_days: model.grace_period_days,
                missed_after_days: model.missed_after_days,
            },
            lifecycle,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

fn corrupt_row(id: uuid::Uuid, column: &str) -> FundError {
    FundError::Internal(format!("fund {id} has status without {column}"))
}

pub fn status_to_model(status: fund_api::domain::FundStatus) -> fund_db::models::FundStatus {
    match status {
        fund_api::domain::FundStatus::Draft => fund_db::models::FundStatus::Draft,
        fund_api::domain::FundStatus::Active => fund_db::models::FundStatus::Active,
        fund_api::domain::FundStatus::Dissolving => fund_db::models::FundStatus::Dissolving,
        fund_api::domain::FundStatus::Dissolved => fund_db::models::FundStatus::Dissolved,
    }
}

pub fn policy_to_model(
    policy: fund_api::domain::LoanApprovalPolicy,
) -> fund_db::models::LoanApprovalPolicy {
    match policy {
        fund_api::domain::LoanApprovalPolicy::AdminOnly => {
            fund_db::models::LoanApprovalPolicy::AdminOnly
        }
        fund_api::domain::LoanApprovalPolicy::AdminWithVoting => {
            fund_db::models::LoanApprovalPolicy::AdminWithVoting
        }
    }
}

pub fn policy_from_model(
    policy: fund_db::models::LoanApprovalPolicy,
) -> fund_api::domain::LoanApprovalPolicy {
    match policy {
        fund_db::models::LoanApprovalPolicy::AdminOnly => {
            fund_api::domain::LoanApprovalPolicy::AdminOnly
        }
        fund_db::models::LoanApprovalPolicy::AdminWithVoting => {
            fund_api::domain::LoanApprovalPolicy::AdminWithVoting
        }
    }
}

pub fn penalty_to_model(penalty: fund_api::domain::PenaltyType) -> fund_db::models::PenaltyType {
    match penalty {
        fund_api::domain::PenaltyType::None => fund_db::models::PenaltyType::None,
        fund_api::domain::PenaltyType::Flat => fund_db::models::PenaltyType::Flat,
        fund_api::domain::PenaltyType::Percentage => fund_db::models::PenaltyType::Percentage,
    }
}

pub fn penalty_from_model(penalty: fund_db::models::PenaltyType) -> fund_api::domain::PenaltyType {
    match penalty {
        fund_db::models::PenaltyType::None => fund_api::domain::PenaltyType::None,
        fund_db::models::PenaltyType::Flat => fund_api::domain::PenaltyType::Flat,
        fund_db::models::PenaltyType::Percentage => fund_api::domain::PenaltyType::Percentage,
    }
}
