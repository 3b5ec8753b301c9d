use async_trait::async_trait;
use fund_api::FundResult;
use uuid::Uuid;

use crate::models::{OutboxEntryModel, VoteModel, VotingSessionModel};

#[async_trait]
pub trait VotingRepository: Send + Sync {
    /// A second session for the same loan yields `Conflict`.
    async fn create_session(
        &self,
        session: VotingSessionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VotingSessionModel>;

    async fn update_session(
        &self,
        session: VotingSessionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VotingSessionModel>;

    async fn find_session_by_id(&self, session_id: Uuid)
        -> FundResult<Option<VotingSessionModel>>;

    async fn find_session_by_loan(&self, loan_id: Uuid) -> FundResult<Option<VotingSessionModel>>;

    /// A duplicate (session, voter) yields `Conflict`.
    async fn create_vote(
        &self,
        vote: VoteModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VoteModel>;

    async fn find_vote(&self, session_id: Uuid, voter_id: Uuid) -> FundResult<Option<VoteModel>>;

    async fn find_votes_by_session(&self, session_id: Uuid) -> FundResult<Vec<VoteModel>>;

    /// (approve, reject) counts.
    async fn count_votes(&self, session_id: Uuid) -> FundResult<(i64, i64)>;
}
