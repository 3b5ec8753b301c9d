use async_trait::async_trait;
use fund_api::FundResult;
use fund_db::repository::JobLockRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Advisory-lock implementation over Postgres session locks. The 64-bit
/// lock key is derived from (job_name, fund_id); collisions only cost a
/// skipped run, never a correctness failure.
pub struct JobLockRepositoryImpl {
    pool: PgPool,
}

impl JobLockRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn lock_key(job_name: &str, fund_id: Uuid) -> i64 {
        // FNV-1a over the composite key, folded into i64.
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in job_name.as_bytes().iter().chain(fund_id.as_bytes()) {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash as i64
    }
}

#[async_trait]
impl JobLockRepository for JobLockRepositoryImpl {
    async fn try_acquire(&self, job_name: &str, fund_id: Uuid) -> FundResult<bool> {
        let row = sqlx::query("SELECT pg_try_advisory_lock($1) AS acquired")
            .bind(Self::lock_key(job_name, fund_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("acquired"))
    }

    async fn release(&self, job_name: &str, fund_id: Uuid) -> FundResult<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(Self::lock_key(job_name, fund_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
