use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::{FundModel, OutboxEntryModel};
use fund_db::repository::FundRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{
    approval_policy_str, fund_status_str, hs, hs_opt, insert_outbox, parse_approval_policy,
    parse_fund_status, parse_penalty_type, penalty_type_str,
};

pub struct FundRepositoryImpl {
    pool: PgPool,
}

impl FundRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_fund_from_row(row: &sqlx::postgres::PgRow) -> FundResult<FundModel> {
    Ok(FundModel {
        id: row.get("id"),
        name: hs::<100>("name", row.get::<String, _>("name").as_str())?,
        description: hs_opt::<500>("description", row.get::<Option<String>, _>("description"))?,
        currency: hs::<3>("currency", row.get::<String, _>("currency").as_str())?,
        monthly_interest_rate: row.get("monthly_interest_rate"),
        minimum_monthly_contribution: row.get("minimum_monthly_contribution"),
        minimum_principal_per_repayment: row.get("minimum_principal_per_repayment"),
        loan_approval_policy: parse_approval_policy(
            &row.get::<String, _>("loan_approval_policy"),
        )?,
        max_loan_per_member: row.get("max_loan_per_member"),
        max_concurrent_loans: row.get("max_concurrent_loans"),
        overdue_penalty_type: parse_penalty_type(&row.get::<String, _>("overdue_penalty_type"))?,
        overdue_penalty_value: row.get("overdue_penalty_value"),
        contribution_day_of_month: row.get("contribution_day_of_month"),
        grace_period_days: row.get("grace_period_days"),
        missed_after_days: row.get("missed_after_days"),
        status: parse_fund_status(&row.get::<String, _>("status"))?,
        activated_at: row.get("activated_at"),
        dissolution_initiated_at: row.get("dissolution_initiated_at"),
        dissolved_at: row.get("dissolved_at"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl FundRepository for FundRepositoryImpl {
    async fn create(
        &self,
        fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO funds (
                id, name, description, currency, monthly_interest_rate,
                minimum_monthly_contribution, minimum_principal_per_repayment,
                loan_approval_policy, max_loan_per_member, max_concurrent_loans,
                overdue_penalty_type, overdue_penalty_value,
                contribution_day_of_month, grace_period_days, missed_after_days,
                status, activated_at, dissolution_initiated_at, dissolved_at,
                version, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22
            )
            "#,
        )
        .bind(fund.id)
        .bind(fund.name.as_str())
        .bind(fund.description.as_ref().map(|d| d.as_str()))
        .bind(fund.currency.as_str())
        .bind(fund.monthly_interest_rate)
        .bind(fund.minimum_monthly_contribution)
        .bind(fund.minimum_principal_per_repayment)
        .bind(approval_policy_str(fund.loan_approval_policy))
        .bind(fund.max_loan_per_member)
        .bind(fund.max_concurrent_loans)
        .bind(penalty_type_str(fund.overdue_penalty_type))
        .bind(fund.overdue_penalty_value)
        .bind(fund.contribution_day_of_month)
        .bind(fund.grace_period_days)
        .bind(fund.missed_after_days)
        .bind(fund_status_str(fund.status))
        .bind(fund.activated_at)
        .bind(fund.dissolution_initiated_at)
        .bind(fund.dissolved_at)
        .bind(fund.version)
        .bind(fund.created_at)
        .bind(fund.updated_at)
        .execute(&mut *tx)
        .await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(fund)
    }

    async fn update(
        &self,
        mut fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundModel> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE funds SET
                name = $3, description = $4, monthly_interest_rate = $5,
                minimum_monthly_contribution = $6,
                minimum_principal_per_repayment = $7, loan_approval_policy = $8,
                max_loan_per_member = $9, max_concurrent_loans = $10,
                overdue_penalty_type = $11, overdue_penalty_value = $12,
                contribution_day_of_month = $13, grace_period_days = $14,
                missed_after_days = $15, status = $16, activated_at = $17,
                dissolution_initiated_at = $18, dissolved_at = $19,
                version = version + 1, updated_at = $20
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(fund.id)
        .bind(fund.version)
        .bind(fund.name.as_str())
        .bind(fund.description.as_ref().map(|d| d.as_str()))
        .bind(fund.monthly_interest_rate)
        .bind(fund.minimum_monthly_contribution)
        .bind(fund.minimum_principal_per_repayment)
        .bind(approval_policy_str(fund.loan_approval_policy))
        .bind(fund.max_loan_per_member)
        .bind(fund.max_concurrent_loans)
        .bind(penalty_type_str(fund.overdue_penalty_type))
        .bind(fund.overdue_penalty_value)
        .bind(fund.contribution_day_of_month)
        .bind(fund.grace_period_days)
        .bind(fund.missed_after_days)
        .bind(fund_status_str(fund.status))
        .bind(fund.activated_at)
        .bind(fund.dissolution_initiated_at)
        .bind(fund.dissolved_at)
        .bind(fund.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FundError::version_conflict("Fund", fund.id, fund.version));
        }
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;

        fund.version += 1;
        Ok(fund)
    }

    async fn find_by_id(&self, fund_id: Uuid) -> FundResult<Option<FundModel>> {
        let row = sqlx::query("SELECT * FROM funds WHERE id = $1")
            .bind(fund_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_fund_from_row).transpose()
    }

    async fn exists(&self, fund_id: Uuid) -> FundResult<bool> {
        let row = sqlx::query("SELECT 1 AS present FROM funds WHERE id = $1")
            .bind(fund_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
