use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::IdempotencyRecordModel;
use fund_db::repository::IdempotencyRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::hs;

pub struct IdempotencyRepositoryImpl {
    pool: PgPool,
}

impl IdempotencyRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_record_from_row(row: &sqlx::postgres::PgRow) -> FundResult<IdempotencyRecordModel> {
    Ok(IdempotencyRecordModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        endpoint: hs::<100>("endpoint", row.get::<String, _>("endpoint").as_str())?,
        idempotency_key: hs::<64>(
            "idempotency_key",
            row.get::<String, _>("idempotency_key").as_str(),
        )?,
        request_hash: hs::<64>("request_hash", row.get::<String, _>("request_hash").as_str())?,
        result_ref: row.get("result_ref"),
        created_at: row.get("created_at"),
    })
}

pub(crate) async fn insert_idempotency_record(
    conn: &mut sqlx::PgConnection,
    record: &IdempotencyRecordModel,
) -> FundResult<()> {
    sqlx::query(
        r#"
        INSERT INTO idempotency_records (
            id, fund_id, endpoint, idempotency_key, request_hash, result_ref,
            created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(record.id)
    .bind(record.fund_id)
    .bind(record.endpoint.as_str())
    .bind(record.idempotency_key.as_str())
    .bind(record.request_hash.as_str())
    .bind(&record.result_ref)
    .bind(record.created_at)
    .execute(conn)
    .await
    .map_err(|err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => FundError::Conflict(
            format!("duplicate idempotency record {}", record.idempotency_key),
        ),
        _ => err.into(),
    })?;
    Ok(())
}

#[async_trait]
impl IdempotencyRepository for IdempotencyRepositoryImpl {
    async fn find(
        &self,
        fund_id: Uuid,
        endpoint: &str,
        idempotency_key: &str,
    ) -> FundResult<Option<IdempotencyRecordModel>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM idempotency_records
            WHERE fund_id = $1 AND endpoint = $2 AND idempotency_key = $3
            "#,
        )
        .bind(fund_id)
        .bind(endpoint)
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(extract_record_from_row).transpose()
    }

    async fn create(&self, record: IdempotencyRecordModel) -> FundResult<IdempotencyRecordModel> {
        let mut conn = self.pool.acquire().await?;
        insert_idempotency_record(&mut *conn, &record).await?;
        Ok(record)
    }
}
