use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::{
    ContributionDueModel, IdempotencyRecordModel, OutboxEntryModel, TransactionModel,
};
use fund_db::repository::ContributionDueRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{due_status_str, insert_outbox, parse_due_status};
use super::idempotency_repository_impl::insert_idempotency_record;
use super::transaction_repository_impl::insert_transaction;

pub struct ContributionDueRepositoryImpl {
    pool: PgPool,
}

impl ContributionDueRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_due_from_row(row: &sqlx::postgres::PgRow) -> FundResult<ContributionDueModel> {
    Ok(ContributionDueModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        user_id: row.get("user_id"),
        month_year: row.get("month_year"),
        amount_due: row.get("amount_due"),
        amount_paid: row.get("amount_paid"),
        status: parse_due_status(&row.get::<String, _>("status"))?,
        due_date: row.get("due_date"),
        paid_date: row.get("paid_date"),
        missed_at: row.get("missed_at"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

async fn update_due_row(
    conn: &mut sqlx::PgConnection,
    due: &ContributionDueModel,
) -> FundResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE contribution_dues SET
            amount_paid = $3, status = $4, paid_date = $5, missed_at = $6,
            version = version + 1, updated_at = $7
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(due.id)
    .bind(due.version)
    .bind(due.amount_paid)
    .bind(due_status_str(due.status))
    .bind(due.paid_date)
    .bind(due.missed_at)
    .bind(due.updated_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(FundError::version_conflict(
            "ContributionDue",
            due.id,
            due.version,
        ));
    }
    Ok(())
}

#[async_trait]
impl ContributionDueRepository for ContributionDueRepositoryImpl {
    async fn create(&self, due: ContributionDueModel) -> FundResult<ContributionDueModel> {
        sqlx::query(
            r#"
            INSERT INTO contribution_dues (
                id, fund_id, user_id, month_year, amount_due, amount_paid,
                status, due_date, paid_date, missed_at, version, created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(due.id)
        .bind(due.fund_id)
        .bind(due.user_id)
        .bind(due.month_year)
        .bind(due.amount_due)
        .bind(due.amount_paid)
        .bind(due_status_str(due.status))
        .bind(due.due_date)
        .bind(due.paid_date)
        .bind(due.missed_at)
        .bind(due.version)
        .bind(due.created_at)
        .bind(due.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FundError::Conflict("duplicate contribution due".to_string())
            }
            _ => err.into(),
        })?;
        Ok(due)
    }

    async fn exists(&self, fund_id: Uuid, user_id: Uuid, month_year: i32) -> FundResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present FROM contribution_dues
            WHERE fund_id = $1 AND user_id = $2 AND month_year = $3
            "#,
        )
        .bind(fund_id)
        .bind(user_id)
        .bind(month_year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    async fn find_by_id(&self, due_id: Uuid) -> FundResult<Option<ContributionDueModel>> {
        let row = sqlx::query("SELECT * FROM contribution_dues WHERE id = $1")
            .bind(due_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_due_from_row).transpose()
    }

    async fn find_by_fund_month(
        &self,
        fund_id: Uuid,
        month_year: i32,
    ) -> FundResult<Vec<ContributionDueModel>> {
        let rows = sqlx::query(
            "SELECT * FROM contribution_dues WHERE fund_id = $1 AND month_year = $2 ORDER BY user_id",
        )
        .bind(fund_id)
        .bind(month_year)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_due_from_row).collect()
    }

    async fn find_unsettled_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<ContributionDueModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM contribution_dues
            WHERE fund_id = $1 AND status <> 'Paid' AND amount_paid < amount_due
            ORDER BY month_year, user_id
            "#,
        )
        .bind(fund_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_due_from_row).collect()
    }

    async fn find_unsettled_by_user(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Vec<ContributionDueModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM contribution_dues
            WHERE fund_id = $1 AND user_id = $2 AND status <> 'Paid'
              AND amount_paid < amount_due
            ORDER BY month_year
            "#,
        )
        .bind(fund_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_due_from_row).collect()
    }

    async fn update(
        &self,
        mut due: ContributionDueModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<ContributionDueModel> {
        let mut tx = self.pool.begin().await?;
        update_due_row(&mut *tx, &due).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        due.version += 1;
        Ok(due)
    }

    async fn record_payment(
        &self,
        mut due: ContributionDueModel,
        transaction: TransactionModel,
        idempotency: IdempotencyRecordModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<ContributionDueModel> {
        let mut tx = self.pool.begin().await?;
        update_due_row(&mut *tx, &due).await?;
        insert_transaction(&mut *tx, &transaction).await?;
        insert_idempotency_record(&mut *tx, &idempotency).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        due.version += 1;
        Ok(due)
    }
}
