use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fund_api::FundResult;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{TransactionModel, TransactionType};

/// Append-only ledger. Every monetary side-effect lands here exactly once;
/// the unique (fund_id, idempotency_key) index backs retry safety.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn append(&self, transaction: TransactionModel) -> FundResult<TransactionModel>;

    async fn find_by_fund(
        &self,
        fund_id: Uuid,
        transaction_type: Option<TransactionType>,
        user_id: Option<Uuid>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> FundResult<Vec<TransactionModel>>;

    async fn sum_by_type(
        &self,
        fund_id: Uuid,
        transaction_type: TransactionType,
    ) -> FundResult<Decimal>;

    async fn sum_by_type_for_user(
        &self,
        fund_id: Uuid,
        transaction_type: TransactionType,
        user_id: Uuid,
    ) -> FundResult<Decimal>;

    async fn exists_by_key(&self, fund_id: Uuid, idempotency_key: &str) -> FundResult<bool>;
}
