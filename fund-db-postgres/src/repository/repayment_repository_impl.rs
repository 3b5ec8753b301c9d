use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::{
    IdempotencyRecordModel, LoanModel, OutboxEntryModel, RepaymentEntryModel, TransactionModel,
};
use fund_db::repository::RepaymentRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{insert_outbox, parse_repayment_status, repayment_status_str};
use super::idempotency_repository_impl::insert_idempotency_record;
use super::loan_repository_impl::update_loan_row;
use super::transaction_repository_impl::insert_transaction;

pub struct RepaymentRepositoryImpl {
    pool: PgPool,
}

impl RepaymentRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_entry_from_row(row: &sqlx::postgres::PgRow) -> FundResult<RepaymentEntryModel> {
    Ok(RepaymentEntryModel {
        id: row.get("id"),
        loan_id: row.get("loan_id"),
        fund_id: row.get("fund_id"),
        month_year: row.get("month_year"),
        interest_due: row.get("interest_due"),
        principal_due: row.get("principal_due"),
        penalty_accrued: row.get("penalty_accrued"),
        amount_paid: row.get("amount_paid"),
        status: parse_repayment_status(&row.get::<String, _>("status"))?,
        due_date: row.get("due_date"),
        paid_date: row.get("paid_date"),
        penalty_applied_for: row.get("penalty_applied_for"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

async fn update_entry_row(
    conn: &mut sqlx::PgConnection,
    entry: &RepaymentEntryModel,
) -> FundResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE repayment_entries SET
            penalty_accrued = $3, amount_paid = $4, status = $5, paid_date = $6,
            penalty_applied_for = $7, version = version + 1, updated_at = $8
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(entry.id)
    .bind(entry.version)
    .bind(entry.penalty_accrued)
    .bind(entry.amount_paid)
    .bind(repayment_status_str(entry.status))
    .bind(entry.paid_date)
    .bind(entry.penalty_applied_for)
    .bind(entry.updated_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(FundError::version_conflict(
            "RepaymentEntry",
            entry.id,
            entry.version,
        ));
    }
    Ok(())
}

#[async_trait]
impl RepaymentRepository for RepaymentRepositoryImpl {
    async fn create(
        &self,
        entry: RepaymentEntryModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO repayment_entries (
                id, loan_id, fund_id, month_year, interest_due, principal_due,
                penalty_accrued, amount_paid, status, due_date, paid_date,
                penalty_applied_for, version, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15
            )
            "#,
        )
        .bind(entry.id)
        .bind(entry.loan_id)
        .bind(entry.fund_id)
        .bind(entry.month_year)
        .bind(entry.interest_due)
        .bind(entry.principal_due)
        .bind(entry.penalty_accrued)
        .bind(entry.amount_paid)
        .bind(repayment_status_str(entry.status))
        .bind(entry.due_date)
        .bind(entry.paid_date)
        .bind(entry.penalty_applied_for)
        .bind(entry.version)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FundError::Conflict("duplicate repayment entry".to_string())
            }
            _ => err.into(),
        })?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn find_by_id(&self, entry_id: Uuid) -> FundResult<Option<RepaymentEntryModel>> {
        let row = sqlx::query("SELECT * FROM repayment_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_entry_from_row).transpose()
    }

    async fn find_by_loan_month(
        &self,
        loan_id: Uuid,
        month_year: i32,
    ) -> FundResult<Option<RepaymentEntryModel>> {
        let row = sqlx::query(
            "SELECT * FROM repayment_entries WHERE loan_id = $1 AND month_year = $2",
        )
        .bind(loan_id)
        .bind(month_year)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(extract_entry_from_row).transpose()
    }

    async fn find_by_loan(&self, loan_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>> {
        let rows = sqlx::query(
            "SELECT * FROM repayment_entries WHERE loan_id = $1 ORDER BY month_year",
        )
        .bind(loan_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_entry_from_row).collect()
    }

    async fn find_open_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM repayment_entries
            WHERE fund_id = $1 AND status IN ('Pending', 'Partial')
            ORDER BY month_year
            "#,
        )
        .bind(fund_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_entry_from_row).collect()
    }

    async fn find_overdue_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<RepaymentEntryModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM repayment_entries
            WHERE fund_id = $1 AND status = 'Overdue'
              AND amount_paid < interest_due + principal_due + penalty_accrued
            ORDER BY month_year
            "#,
        )
        .bind(fund_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_entry_from_row).collect()
    }

    async fn update(
        &self,
        mut entry: RepaymentEntryModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel> {
        let mut tx = self.pool.begin().await?;
        update_entry_row(&mut *tx, &entry).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        entry.version += 1;
        Ok(entry)
    }

    async fn record_payment(
        &self,
        mut entry: RepaymentEntryModel,
        loan: LoanModel,
        cash_transaction: TransactionModel,
        interest_transaction: Option<TransactionModel>,
        idempotency: IdempotencyRecordModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<RepaymentEntryModel> {
        let mut tx = self.pool.begin().await?;
        update_entry_row(&mut *tx, &entry).await?;
        update_loan_row(&mut *tx, &loan).await?;
        insert_transaction(&mut *tx, &cash_transaction).await?;
        if let Some(interest) = &interest_transaction {
            insert_transaction(&mut *tx, interest).await?;
        }
        insert_idempotency_record(&mut *tx, &idempotency).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        entry.version += 1;
        Ok(entry)
    }
}
