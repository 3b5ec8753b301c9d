use fund_api::domain::{ThresholdType, Vote, VoteDecision, VotingResult, VotingSession};
use fund_db::models::{VoteModel, VotingSessionModel};

pub struct VotingMapper;

impl VotingMapper {
    pub fn session_to_model(session: VotingSession) -> VotingSessionModel {
        VotingSessionModel {
            id: session.id,
            loan_id: session.loan_id,
            fund_id: session.fund_id,
            window_start: session.window_start,
            window_end: session.window_end,
            threshold_type: threshold_to_model(session.threshold_type),
            threshold_value: session.threshold_value,
            result: result_to_model(session.result),
            finalised_by: session.finalised_by,
            finalised_date: session.finalised_date,
            override_used: session.override_used,
            created_at: session.created_at,
        }
    }

    pub fn session_from_model(model: VotingSessionModel) -> VotingSession {
        VotingSession {
            id: model.id,
            loan_id: model.loan_id,
            fund_id: model.fund_id,
            window_start: model.window_start,
            window_end: model.window_end,
            threshold_type: threshold_from_model(model.threshold_type),
            threshold_value: model.threshold_value,
            result: result_from_model(model.result),
            finalised_by: model.finalised_by,
            finalised_date: model.finalised_date,
            override_used: model.override_used,
            created_at: model.created_at,
        }
    }

    pub fn vote_to_model(vote: Vote) -> VoteModel {
        VoteModel {
            id: vote.id,
            session_id: vote.session_id,
            voter_id: vote.voter_id,
            decision: decision_to_model(vote.decision),
            cast_at: vote.cast_at,
        }
    }

    pub fn vote_from_model(model: VoteModel) -> Vote {
        Vote {
            id: model.id,
            session_id: model.session_id,
            voter_id: model.voter_id,
            decision: decision_from_model(model.decision),
            cast_at: model.cast_at,
        }
    }
}

pub fn threshold_to_model(threshold: ThresholdType) -> fund_db::models::ThresholdType {
    match threshold {
        ThresholdType::Majority => fund_db::models::ThresholdType::Majority,
        ThresholdType::Percentage => fund_db::models::ThresholdType::Percentage,
    }
}

pub fn threshold_from_model(threshold: fund_db::models::ThresholdType) -> ThresholdType {
    match threshold {
        fund_db::models::ThresholdType::Majority => ThresholdType::Majority,
        fund_db::models::ThresholdType::Percentage => ThresholdType::Percentage,
    }
}

pub fn result_to_model(result: VotingResult) -> fund_db::models::VotingResult {
    match result {
        VotingResult::Pending => fund_db::models::VotingResult::Pending,
        VotingResult::Approved => fund_db::models::VotingResult::Approved,
        VotingResult::Rejected => fund_db::models::VotingResult::Rejected,
        VotingResult::NoQuorum => fund_db::models::VotingResult::NoQuorum,
    }
}

pub fn result_from_model(result: fund_db::models::VotingResult) -> VotingResult {
    match result {
        fund_db::models::VotingResult::Pending => VotingResult::Pending,
        fund_db::models::VotingResult::Approved => VotingResult::Approved,
        fund_db::models::VotingResult::Rejected => VotingResult::Rejected,
        fund_db::models::VotingResult::NoQuorum => VotingResult::NoQuorum,
    }
}

pub fn decision_to_model(decision: VoteDecision) -> fund_db::models::VoteDecision {
    match decision {
        VoteDecision::Approve => fund_db::models::VoteDecision::Approve,
        VoteDecision::Reject => fund_db::models::VoteDecision::Reject,
    }
}

pub fn decision_from_model(decision: fund_db::models::VoteDecision) -> VoteDecision {
    match decision {
        fund_db::models::VoteDecision::Approve => VoteDecision::Approve,
        fund_db::models::VoteDecision::Reject => VoteDecision::Reject,
    }
}
