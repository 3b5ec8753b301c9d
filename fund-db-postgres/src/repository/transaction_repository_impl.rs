use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fund_api::{FundError, FundResult};
use fund_db::models::{TransactionModel, TransactionType};
use fund_db::repository::TransactionRepository;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{
    hs, parse_reference_type, parse_transaction_type, reference_type_str, transaction_type_str,
};

pub struct TransactionRepositoryImpl {
    pool: PgPool,
}

impl TransactionRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_transaction_from_row(row: &sqlx::postgres::PgRow) -> FundResult<TransactionModel> {
    Ok(TransactionModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        user_id: row.get("user_id"),
        transaction_type: parse_transaction_type(&row.get::<String, _>("transaction_type"))?,
        amount: row.get("amount"),
        idempotency_key: hs::<64>(
            "idempotency_key",
            row.get::<String, _>("idempotency_key").as_str(),
        )?,
        reference_entity_type: row
            .get::<Option<String>, _>("reference_entity_type")
            .as_deref()
            .map(parse_reference_type)
            .transpose()?,
        reference_entity_id: row.get("reference_entity_id"),
        created_at: row.get("created_at"),
    })
}

/// Ledger append inside the caller's transaction. The unique
/// (fund_id, idempotency_key) index makes re-appends surface as `Conflict`.
pub(crate) async fn insert_transaction(
    conn: &mut sqlx::PgConnection,
    transaction: &TransactionModel,
) -> FundResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, fund_id, user_id, transaction_type, amount, idempotency_key,
            reference_entity_type, reference_entity_id, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.fund_id)
    .bind(transaction.user_id)
    .bind(transaction_type_str(transaction.transaction_type))
    .bind(transaction.amount)
    .bind(transaction.idempotency_key.as_str())
    .bind(transaction.reference_entity_type.map(reference_type_str))
    .bind(transaction.reference_entity_id)
    .bind(transaction.created_at)
    .execute(conn)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => FundError::Conflict(
            format!("duplicate ledger idempotency key {}", transaction.idempotency_key),
        ),
        _ => err.into(),
    })?;
    Ok(())
}

#[async_trait]
impl TransactionRepository for TransactionRepositoryImpl {
    async fn append(&self, transaction: TransactionModel) -> FundResult<TransactionModel> {
        let mut conn = self.pool.acquire().await?;
        insert_transaction(&mut *conn, &transaction).await?;
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
        let rows = sqlx::query(
            r#"
            SELECT * FROM transactions
            WHERE fund_id = $1
              AND ($2::TEXT IS NULL OR transaction_type = $2)
              AND ($3::UUID IS NULL OR user_id = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            ORDER BY created_at
            "#,
        )
        .bind(fund_id)
        .bind(transaction_type.map(transaction_type_str))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_transaction_from_row).collect()
    }

    async fn sum_by_type(
        &self,
        fund_id: Uuid,
        transaction_type: TransactionType,
    ) -> FundResult<Decimal> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total FROM transactions
            WHERE fund_id = $1 AND transaction_type = $2
            "#,
        )
        .bind(fund_id)
        .bind(transaction_type_str(transaction_type))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("total"))
    }

    async fn sum_by_type_for_user(
        &self,
        fund_id: Uuid,
        transaction_type: TransactionType,
        user_id: Uuid,
    ) -> FundResult<Decimal> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total FROM transactions
            WHERE fund_id = $1 AND transaction_type = $2 AND user_id = $3
            "#,
        )
        .bind(fund_id)
        .bind(transaction_type_str(transaction_type))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("total"))
    }

    async fn exists_by_key(&self, fund_id: Uuid, idempotency_key: &str) -> FundResult<bool> {
        let row = sqlx::query(
            "SELECT 1 AS present FROM transactions WHERE fund_id = $1 AND idempotency_key = $2",
        )
        .bind(fund_id)
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}
