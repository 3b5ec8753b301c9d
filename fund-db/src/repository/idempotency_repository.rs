use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::IdempotencyRecordModel;

/// Registry backing the Idempotency-Key protocol: a retry with the same
/// (fund, endpoint, key) replays the stored result; a different request
/// hash under the same key is a `Conflict`.
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    async fn find(
        &self,
        fund_id: Uuid,
        endpoint: &str,
        idempotency_key: &str,
    ) -> FundResult<Option<IdempotencyRecordModel>>;

    async fn create(&self, record: IdempotencyRecordModel) -> FundResult<IdempotencyRecordModel>;
}
