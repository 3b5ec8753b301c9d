use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common::MonthYear;
use super::fund::FundConfig;
use super::membership::FundRole;
use super::voting::{VoteDecision, VotingResult};

/// Envelope every emitted event carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub fund_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub event: DomainEvent,
}

impl EventEnvelope {
    pub fn new(fund_id: Uuid, occurred_at: DateTime<Utc>, event: DomainEvent) -> Self {
        EventEnvelope {
            event_id: Uuid::new_v4(),
            fund_id,
            occurred_at,
            event,
        }
    }
}

/// Typed domain events consumed by external collaborators (notification
/// dispatch, projections, reporting). Serialised form is the outbox payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    FundCreated {
        name: String,
        config: FundConfig,
    },
    FundActivated {
        config: FundConfig,
    },
    DissolutionInitiated,
    FundDissolved {
        settlement_id: Uuid,
    },
    MemberJoined {
        user_id: Uuid,
        role: FundRole,
        monthly_contribution_amount: Decimal,
    },
    MemberRemoved {
        user_id: Uuid,
    },
    FundAdminAssigned {
        user_id: Uuid,
    },
    InvitationSent {
        invitation_id: Uuid,
        target_contact: String,
        invited_by: Uuid,
    },
    ContributionDueGenerated {
        month_year: MonthYear,
        total_amount: Decimal,
        member_count: u32,
    },
    ContributionPaid {
        due_id: Uuid,
        user_id: Uuid,
        amount: Decimal,
    },
    ContributionOverdue {
        due_id: Uuid,
        user_id: Uuid,
        remaining_balance: Decimal,
    },
    LoanRequested {
        loan_id: Uuid,
        borrower_id: Uuid,
        principal: Decimal,
    },
    LoanApproved {
        loan_id: Uuid,
        borrower_id: Uuid,
        principal: Decimal,
        installment: Decimal,
    },
    LoanRejected {
        loan_id: Uuid,
        borrower_id: Uuid,
        reason: String,
    },
    LoanDisbursed {
        loan_id: Uuid,
        borrower_id: Uuid,
        principal: Decimal,
    },
    LoanClosed {
        loan_id: Uuid,
        borrower_id: Uuid,
    },
    RepaymentDueGenerated {
        entry_id: Uuid,
        loan_id: Uuid,
        month_year: MonthYear,
        interest_due: Decimal,
        principal_due: Decimal,
    },
    RepaymentRecorded {
        entry_id: Uuid,
        loan_id: Uuid,
        amount: Decimal,
        interest_paid: Decimal,
        principal_paid: Decimal,
        excess_to_principal: Decimal,
    },
    RepaymentPenaltyApplied {
        entry_id: Uuid,
        loan_id: Uuid,
        month_year: MonthYear,
        penalty: Decimal,
    },
    VotingStarted {
        session_id: Uuid,
        loan_id: Uuid,
        window_end: DateTime<Utc>,
    },
    VoteCast {
        session_id: Uuid,
        voter_id: Uuid,
        decision: VoteDecision,
    },
    VotingFinalised {
        session_id: Uuid,
        loan_id: Uuid,
        result: VotingResult,
        override_used: bool,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::FundCreated { .. } => "FundCreated",
            DomainEvent::FundActivated { .. } => "FundActivated",
            DomainEvent::DissolutionInitiated => "DissolutionInitiated",
            DomainEvent::FundDissolved { .. } => "FundDissolved",
            DomainEvent::MemberJoined { .. } => "MemberJoined",
            DomainEvent::MemberRemoved { .. } => "MemberRemoved",
            DomainEvent::FundAdminAssigned { .. } => "FundAdminAssigned",
            DomainEvent::InvitationSent { .. } => "InvitationSent",
            DomainEvent::ContributionDueGenerated { .. } => "ContributionDueGenerated",
            DomainEvent::ContributionPaid { .. } => "ContributionPaid",
            DomainEvent::ContributionOverdue { .. } => "ContributionOverdue",
            DomainEvent::LoanRequested { .. } => "LoanRequested",
            DomainEvent::LoanApproved { .. } => "LoanApproved",
            DomainEvent::LoanRejected { .. } => "LoanRejected",
            DomainEvent::LoanDisbursed { .. } => "LoanDisbursed",
            DomainEvent::LoanClosed { .. } => "LoanClosed",
            DomainEvent::RepaymentDueGenerated { .. } => "RepaymentDueGenerated",
            DomainEvent::RepaymentRecorded { .. } => "RepaymentRecorded",
            DomainEvent::RepaymentPenaltyApplied { .. } => "RepaymentPenaltyApplied",
            DomainEvent::VotingStarted { .. } => "VotingStarted",
            DomainEvent::VoteCast { .. } => "VoteCast",
            DomainEvent::VotingFinalised { .. } => "VotingFinalised",
        }
    }
}
