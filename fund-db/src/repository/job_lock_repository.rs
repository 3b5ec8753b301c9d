use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

/// Advisory lock keyed by (job_name, fund_id): at most one instance of a
/// given periodic job runs per fund at a time.
#[async_trait]
pub trait JobLockRepository: Send + Sync {
    async fn try_acquire(&self, job_name: &str, fund_id: Uuid) -> FundResult<bool>;

    async fn release(&self, job_name: &str, fund_id: Uuid) -> FundResult<()>;
}
