use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{ThresholdType, Vote, VoteDecision, VoteTally, VotingSession},
    FundResult,
};

/// Voting sessions attached to loan approval: start, cast, finalise with
/// admin override.
#[async_trait]
pub trait VotingService: Send + Sync {
    /// Open a session for a PendingApproval loan. At most one session per
    /// loan; window length 24-72 hours.
    async fn start_voting(&self, request: StartVotingRequest) -> FundResult<VotingSession>;

    /// Cast an immutable vote. Fails once the window is past or the session
    /// finalised; one vote per (session, voter).
    async fn cast_vote(
        &self,
        session_id: Uuid,
        voter_id: Uuid,
        decision: VoteDecision,
    ) -> FundResult<Vote>;

    /// Tally the votes and finalise with the admin's decision. When the
    /// natural outcome exists and the admin contradicts it, the session is
    /// flagged `override_used` and audited as an override.
    async fn finalise_voting(
        &self,
        session_id: Uuid,
        admin_id: Uuid,
        admin_decision: VoteDecision,
    ) -> FundResult<VotingSession>;

    async fn find_session_by_loan(&self, loan_id: Uuid) -> FundResult<Option<VotingSession>>;

    async fn tally(&self, session_id: Uuid) -> FundResult<VoteTally>;
}

#[derive(Debug, Clone, Validate)]
pub struct StartVotingRequest {
    pub loan_id: Uuid,
    #[validate(range(min = 24, max = 72))]
    pub window_hours: i64,
    pub threshold_type: ThresholdType,
    /// Percentage threshold in [0, 100]; ignored for Majority.
    pub threshold_value: Decimal,
    pub started_by: Uuid,
}
