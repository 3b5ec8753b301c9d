use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::{LoanModel, OutboxEntryModel, TransactionModel};
use fund_db::repository::LoanRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{hs_opt, insert_outbox, loan_status_str, parse_loan_status};
use super::transaction_repository_impl::insert_transaction;

pub struct LoanRepositoryImpl {
    pool: PgPool,
}

impl LoanRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_loan_from_row(row: &sqlx::postgres::PgRow) -> FundResult<LoanModel> {
    Ok(LoanModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        borrower_id: row.get("borrower_id"),
        principal_amount: row.get("principal_amount"),
        requested_start_month: row.get("requested_start_month"),
        purpose: hs_opt::<200>("purpose", row.get::<Option<String>, _>("purpose"))?,
        outstanding_principal: row.get("outstanding_principal"),
        status: parse_loan_status(&row.get::<String, _>("status"))?,
        monthly_interest_rate: row.get("monthly_interest_rate"),
        scheduled_installment: row.get("scheduled_installment"),
        minimum_principal: row.get("minimum_principal"),
        approved_by: row.get("approved_by"),
        approval_date: row.get("approval_date"),
        disbursement_date: row.get("disbursement_date"),
        rejection_reason: hs_opt::<200>(
            "rejection_reason",
            row.get::<Option<String>, _>("rejection_reason"),
        )?,
        rejected_at: row.get("rejected_at"),
        closed_date: row.get("closed_date"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

pub(crate) async fn update_loan_row(
    conn: &mut sqlx::PgConnection,
    loan: &LoanModel,
) -> FundResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE loans SET
            outstanding_principal = $3, status = $4, monthly_interest_rate = $5,
            scheduled_installment = $6, minimum_principal = $7, approved_by = $8,
            approval_date = $9, disbursement_date = $10, rejection_reason = $11,
            rejected_at = $12, closed_date = $13, version = version + 1,
            updated_at = $14
        WHERE id = $1 AND version = $2
        "#,
    )
    .bind(loan.id)
    .bind(loan.version)
    .bind(loan.outstanding_principal)
    .bind(loan_status_str(loan.status))
    .bind(loan.monthly_interest_rate)
    .bind(loan.scheduled_installment)
    .bind(loan.minimum_principal)
    .bind(loan.approved_by)
    .bind(loan.approval_date)
    .bind(loan.disbursement_date)
    .bind(loan.rejection_reason.as_ref().map(|r| r.as_str()))
    .bind(loan.rejected_at)
    .bind(loan.closed_date)
    .bind(loan.updated_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(FundError::version_conflict("Loan", loan.id, loan.version));
    }
    Ok(())
}

#[async_trait]
impl LoanRepository for LoanRepositoryImpl {
    async fn create(
        &self,
        loan: LoanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO loans (
                id, fund_id, borrower_id, principal_amount, requested_start_month,
                purpose, outstanding_principal, status, monthly_interest_rate,
                scheduled_installment, minimum_principal, approved_by,
                approval_date, disbursement_date, rejection_reason, rejected_at,
                closed_date, version, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(loan.id)
        .bind(loan.fund_id)
        .bind(loan.borrower_id)
        .bind(loan.principal_amount)
        .bind(loan.requested_start_month)
        .bind(loan.purpose.as_ref().map(|p| p.as_str()))
        .bind(loan.outstanding_principal)
        .bind(loan_status_str(loan.status))
        .bind(loan.monthly_interest_rate)
        .bind(loan.scheduled_installment)
        .bind(loan.minimum_principal)
        .bind(loan.approved_by)
        .bind(loan.approval_date)
        .bind(loan.disbursement_date)
        .bind(loan.rejection_reason.as_ref().map(|r| r.as_str()))
        .bind(loan.rejected_at)
        .bind(loan.closed_date)
        .bind(loan.version)
        .bind(loan.created_at)
        .bind(loan.updated_at)
        .execute(&mut *tx)
        .await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(loan)
    }

    async fn update(
        &self,
        mut loan: LoanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel> {
        let mut tx = self.pool.begin().await?;
        update_loan_row(&mut *tx, &loan).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        loan.version += 1;
        Ok(loan)
    }

    async fn approve_and_disburse(
        &self,
        mut loan: LoanModel,
        disbursement: TransactionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<LoanModel> {
        let mut tx = self.pool.begin().await?;
        update_loan_row(&mut *tx, &loan).await?;
        insert_transaction(&mut *tx, &disbursement).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        loan.version += 1;
        Ok(loan)
    }

    async fn find_by_id(&self, loan_id: Uuid) -> FundResult<Option<LoanModel>> {
        let row = sqlx::query("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_loan_from_row).transpose()
    }

    async fn find_by_borrower(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<Vec<LoanModel>> {
        let rows = sqlx::query(
            "SELECT * FROM loans WHERE fund_id = $1 AND borrower_id = $2 ORDER BY created_at",
        )
        .bind(fund_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_loan_from_row).collect()
    }

    async fn count_open_by_borrower(&self, fund_id: Uuid, user_id: Uuid) -> FundResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS open_count FROM loans
            WHERE fund_id = $1 AND borrower_id = $2
              AND status IN ('PendingApproval', 'Approved', 'Active')
            "#,
        )
        .bind(fund_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("open_count"))
    }

    async fn find_open_by_fund(&self, fund_id: Uuid) -> FundResult<Vec<LoanModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM loans
            WHERE fund_id = $1 AND status IN ('PendingApproval', 'Approved', 'Active')
            ORDER BY created_at
            "#,
        )
        .bind(fund_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_loan_from_row).collect()
    }
}
