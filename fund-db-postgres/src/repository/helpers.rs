//! Shared row-extraction and enum codec helpers. Enums are stored as TEXT
//! and parsed explicitly so a bad row surfaces as a validation error, not a
//! decode panic.

use fund_api::{FundError, FundResult};
use fund_db::models::{
    ContributionDueStatus, FundRole, FundStatus, InvitationStatus, LoanApprovalPolicy, LoanStatus,
    OutboxEntryModel, PenaltyType, ReferenceEntityType, RepaymentStatus, SettlementStatus,
    ThresholdType, TransactionType, VoteDecision, VotingResult,
};
use heapless::String as HeaplessString;
use sqlx::PgConnection;

pub fn hs<const N: usize>(field: &'static str, value: &str) -> FundResult<HeaplessString<N>> {
    HeaplessString::try_from(value).map_err(|_| FundError::Validation {
        field: field.to_string(),
        message: format!("value exceeds {N} characters"),
    })
}

pub fn hs_opt<const N: usize>(
    field: &'static str,
    value: Option<String>,
) -> FundResult<Option<HeaplessString<N>>> {
    value.as_deref().map(|v| hs::<N>(field, v)).transpose()
}

fn bad_enum(field: &'static str, value: &str) -> FundError {
    FundError::Validation {
        field: field.to_string(),
        message: format!("invalid enum value: {value}"),
    }
}

pub fn fund_status_str(status: FundStatus) -> &'static str {
    match status {
        FundStatus::Draft => "Draft",
        FundStatus::Active => "Active",
        FundStatus::Dissolving => "Dissolving",
        FundStatus::Dissolved => "Dissolved",
    }
}

pub fn parse_fund_status(value: &str) -> FundResult<FundStatus> {
    match value {
        "Draft" => Ok(FundStatus::Draft),
        "Active" => Ok(FundStatus::Active),
        "Dissolving" => Ok(FundStatus::Dissolving),
        "Dissolved" => Ok(FundStatus::Dissolved),
        _ => Err(bad_enum("status", value)),
    }
}

pub fn approval_policy_str(policy: LoanApprovalPolicy) -> &'static str {
    match policy {
        LoanApprovalPolicy::AdminOnly => "AdminOnly",
        LoanApprovalPolicy::AdminWithVoting => "AdminWithVoting",
    }
}

pub fn parse_approval_policy(value: &str) -> FundResult<LoanApprovalPolicy> {
    match value {
        "AdminOnly" => Ok(LoanApprovalPolicy::AdminOnly),
        "AdminWithVoting" => Ok(LoanApprovalPolicy::AdminWithVoting),
        _ => Err(bad_enum("loan_approval_policy", value)),
    }
}

pub fn penalty_type_str(penalty: PenaltyType) -> &'static str {
    match penalty {
        PenaltyType::None => "None",
        PenaltyType::Flat => "Flat",
        PenaltyType::Percentage => "Percentage",
    }
}

pub fn parse_penalty_type(value: &str) -> FundResult<PenaltyType> {
    match value {
        "None" => Ok(PenaltyType::None),
        "Flat" => Ok(PenaltyType::Flat),
        "Percentage" => Ok(PenaltyType::Percentage),
        _ => Err(bad_enum("overdue_penalty_type", value)),
    }
}

pub fn fund_role_str(role: FundRole) -> &'static str {
    match role {
        FundRole::Admin => "Admin",
        FundRole::Editor => "Editor",
        FundRole::Guest => "Guest",
    }
}

pub fn parse_fund_role(value: &str) -> FundResult<FundRole> {
    match value {
        "Admin" => Ok(FundRole::Admin),
        "Editor" => Ok(FundRole::Editor),
        "Guest" => Ok(FundRole::Guest),
        _ => Err(bad_enum("role", value)),
    }
}

pub fn invitation_status_str(status: InvitationStatus) -> &'static str {
    match status {
        InvitationStatus::Pending => "Pending",
        InvitationStatus::Accepted => "Accepted",
        InvitationStatus::Declined => "Declined",
        InvitationStatus::Expired => "Expired",
    }
}

pub fn parse_invitation_status(value: &str) -> FundResult<InvitationStatus> {
    match value {
        "Pending" => Ok(InvitationStatus::Pending),
        "Accepted" => Ok(InvitationStatus::Accepted),
        "Declined" => Ok(InvitationStatus::Declined),
        "Expired" => Ok(InvitationStatus::Expired),
        _ => Err(bad_enum("invitation_status", value)),
    }
}

pub fn due_status_str(status: ContributionDueStatus) -> &'static str {
    match status {
        ContributionDueStatus::Pending => "Pending",
        ContributionDueStatus::Partial => "Partial",
        ContributionDueStatus::Paid => "Paid",
        ContributionDueStatus::Late => "Late",
        ContributionDueStatus::Missed => "Missed",
    }
}

pub fn parse_due_status(value: &str) -> FundResult<ContributionDueStatus> {
    match value {
        "Pending" => Ok(ContributionDueStatus::Pending),
        "Partial" => Ok(ContributionDueStatus::Partial),
        "Paid" => Ok(ContributionDueStatus::Paid),
        "Late" => Ok(ContributionDueStatus::Late),
        "Missed" => Ok(ContributionDueStatus::Missed),
        _ => Err(bad_enum("due_status", value)),
    }
}

pub fn transaction_type_str(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Contribution => "Contribution",
        TransactionType::Disbursement => "Disbursement",
        TransactionType::Repayment => "Repayment",
        TransactionType::InterestIncome => "InterestIncome",
        TransactionType::Penalty => "Penalty",
    }
}

pub fn parse_transaction_type(value: &str) -> FundResult<TransactionType> {
    match value {
        "Contribution" => Ok(TransactionType::Contribution),
        "Disbursement" => Ok(TransactionType::Disbursement),
        "Repayment" => Ok(TransactionType::Repayment),
        "InterestIncome" => Ok(TransactionType::InterestIncome),
        "Penalty" => Ok(TransactionType::Penalty),
        _ => Err(bad_enum("transaction_type", value)),
    }
}

pub fn reference_type_str(reference_type: ReferenceEntityType) -> &'static str {
    match reference_type {
        ReferenceEntityType::ContributionDue => "ContributionDue",
        ReferenceEntityType::Loan => "Loan",
        ReferenceEntityType::RepaymentEntry => "RepaymentEntry",
        ReferenceEntityType::DissolutionSettlement => "DissolutionSettlement",
    }
}

pub fn parse_reference_type(value: &str) -> FundResult<ReferenceEntityType> {
    match value {
        "ContributionDue" => Ok(ReferenceEntityType::ContributionDue),
        "Loan" => Ok(ReferenceEntityType::Loan),
        "RepaymentEntry" => Ok(ReferenceEntityType::RepaymentEntry),
        "DissolutionSettlement" => Ok(ReferenceEntityType::DissolutionSettlement),
        _ => Err(bad_enum("reference_entity_type", value)),
    }
}

pub fn loan_status_str(status: LoanStatus) -> &'static str {
    match status {
        LoanStatus::PendingApproval => "PendingApproval",
        LoanStatus::Approved => "Approved",
        LoanStatus::Active => "Active",
        LoanStatus::Rejected => "Rejected",
        LoanStatus::Closed => "Closed",
    }
}

pub fn parse_loan_status(value: &str) -> FundResult<LoanStatus> {
    match value {
        "PendingApproval" => Ok(LoanStatus::PendingApproval),
        "Approved" => Ok(LoanStatus::Approved),
        "Active" => Ok(LoanStatus::Active),
        "Rejected" => Ok(LoanStatus::Rejected),
        "Closed" => Ok(LoanStatus::Closed),
        _ => Err(bad_enum("loan_status", value)),
    }
}

pub fn repayment_status_str(status: RepaymentStatus) -> &'static str {
    match status {
        RepaymentStatus::Pending => "Pending",
        RepaymentStatus::Partial => "Partial",
        RepaymentStatus::Paid => "Paid",
        RepaymentStatus::Overdue => "Overdue",
    }
}

pub fn parse_repayment_status(value: &str) -> FundResult<RepaymentStatus> {
    match value {
        "Pending" => Ok(RepaymentStatus::Pending),
        "Partial" => Ok(RepaymentStatus::Partial),
        "Paid" => Ok(RepaymentStatus::Paid),
        "Overdue" => Ok(RepaymentStatus::Overdue),
        _ => Err(bad_enum("repayment_status", value)),
    }
}

pub fn threshold_type_str(threshold: ThresholdType) -> &'static str {
    match threshold {
        ThresholdType::Majority => "Majority",
        ThresholdType::Percentage => "Percentage",
    }
}

pub fn parse_threshold_type(value: &str) -> FundResult<ThresholdType> {
    match value {
        "Majority" => Ok(ThresholdType::Majority),
        "Percentage" => Ok(ThresholdType::Percentage),
        _ => Err(bad_enum("threshold_type", value)),
    }
}

pub fn voting_result_str(result: VotingResult) -> &'static str {
    match result {
        VotingResult::Pending => "Pending",
        VotingResult::Approved => "Approved",
        VotingResult::Rejected => "Rejected",
        VotingResult::NoQuorum => "NoQuorum",
    }
}

pub fn parse_voting_result(value: &str) -> FundResult<VotingResult> {
    match value {
        "Pending" => Ok(VotingResult::Pending),
        "Approved" => Ok(VotingResult::Approved),
        "Rejected" => Ok(VotingResult::Rejected),
        "NoQuorum" => Ok(VotingResult::NoQuorum),
        _ => Err(bad_enum("voting_result", value)),
    }
}

pub fn vote_decision_str(decision: VoteDecision) -> &'static str {
    match decision {
        VoteDecision::Approve => "Approve",
        VoteDecision::Reject => "Reject",
    }
}

pub fn parse_vote_decision(value: &str) -> FundResult<VoteDecision> {
    match value {
        "Approve" => Ok(VoteDecision::Approve),
        "Reject" => Ok(VoteDecision::Reject),
        _ => Err(bad_enum("decision", value)),
    }
}

pub fn settlement_status_str(status: SettlementStatus) -> &'static str {
    match status {
        SettlementStatus::Draft => "Draft",
        SettlementStatus::Ready => "Ready",
        SettlementStatus::Confirmed => "Confirmed",
    }
}

pub fn parse_settlement_status(value: &str) -> FundResult<SettlementStatus> {
    match value {
        "Draft" => Ok(SettlementStatus::Draft),
        "Ready" => Ok(SettlementStatus::Ready),
        "Confirmed" => Ok(SettlementStatus::Confirmed),
        _ => Err(bad_enum("settlement_status", value)),
    }
}

/// Insert staged outbox rows inside the caller's transaction.
pub async fn insert_outbox(
    conn: &mut PgConnection,
    entries: &[OutboxEntryModel],
) -> FundResult<()> {
    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO outbox_entries (
                id, fund_id, event_id, event_type, payload, attempts,
                next_attempt_at, published_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.fund_id)
        .bind(entry.event_id)
        .bind(entry.event_type.as_str())
        .bind(&entry.payload)
        .bind(entry.attempts)
        .bind(entry.next_attempt_at)
        .bind(entry.published_at)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
