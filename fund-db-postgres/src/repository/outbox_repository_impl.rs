use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fund_api::FundResult;
use fund_db::models::OutboxEntryModel;
use fund_db::repository::OutboxRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{hs, insert_outbox};

pub struct OutboxRepositoryImpl {
    pool: PgPool,
}

impl OutboxRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_entry_from_row(row: &sqlx::postgres::PgRow) -> FundResult<OutboxEntryModel> {
    Ok(OutboxEntryModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        event_id: row.get("event_id"),
        event_type: hs::<50>("event_type", row.get::<String, _>("event_type").as_str())?,
        payload: row.get("payload"),
        attempts: row.get("attempts"),
        next_attempt_at: row.get("next_attempt_at"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl OutboxRepository for OutboxRepositoryImpl {
    async fn enqueue(&self, entry: OutboxEntryModel) -> FundResult<OutboxEntryModel> {
        let mut conn = self.pool.acquire().await?;
        insert_outbox(&mut *conn, std::slice::from_ref(&entry)).await?;
        Ok(entry)
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> FundResult<Vec<OutboxEntryModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM outbox_entries
            WHERE published_at IS NULL AND next_attempt_at <= $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_entry_from_row).collect()
    }

    async fn mark_published(&self, entry_id: Uuid, published_at: DateTime<Utc>) -> FundResult<()> {
        sqlx::query("UPDATE outbox_entries SET published_at = $2 WHERE id = $1")
            .bind(entry_id)
            .bind(published_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reschedule(
        &self,
        entry_id: Uuid,
        attempts: i32,
        next_attempt_at: DateTime<Utc>,
    ) -> FundResult<()> {
        sqlx::query(
            "UPDATE outbox_entries SET attempts = $2, next_attempt_at = $3 WHERE id = $1",
        )
        .bind(entry_id)
        .bind(attempts)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
