mod common;

use common::{default_config, harness, ledger_balance, setup_active_fund};
use fund_api::{
    domain::{LoanStatus, MonthYear, TransactionType},
    service::{ContributionService, LoanRequest, LoanService},
    FundError,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn loan_request(fund_id: Uuid, borrower: Uuid, principal: Decimal) -> LoanRequest {
    LoanRequest {
        fund_id,
        borrower_id: borrower,
        principal_amount: principal,
        requested_start_month: MonthYear::new(2025, 2).unwrap(),
        purpose: Some("working capital".to_string()),
    }
}

#[tokio::test]
async fn request_requires_active_fund() {
    let h = harness().await;
    let result = h
        .loan_service
        .request_loan(loan_request(Uuid::new_v4(), Uuid::new_v4(), money(100000)))
        .await;
    // No projection exists for an unknown fund.
    assert!(matches!(result, Err(FundError::NotFound { .. })));
}

#[tokio::test]
async fn per_member_cap_is_enforced() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let mut config = default_config();
    config.max_loan_per_member = Some(money(500000));
    let fund = setup_active_fund(&h, config, admin, &[(borrower, money(10000))]).await;

    let result = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(600000)))
        .await;
    assert!(matches!(result, Err(FundError::MaxLoanExceeded { .. })));

    let ok = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(500000)))
        .await
        .unwrap();
    assert_eq!(ok.status(), LoanStatus::PendingApproval);
}

#[tokio::test]
async fn concurrent_loan_cap_counts_open_loans() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let mut config = default_config();
    config.max_concurrent_loans = Some(2);
    let fund = setup_active_fund(&h, config, admin, &[(borrower, money(10000))]).await;

    h.loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await
        .unwrap();
    h.loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await
        .unwrap();
    let third = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await;
    assert!(matches!(third, Err(FundError::MaxConcurrentLoans { .. })));
}

#[tokio::test]
async fn approval_snapshots_terms_and_disburses() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;

    let loan = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(1000000)))
        .await
        .unwrap();

    let approved = h
        .loan_service
        .approve_loan(loan.id, admin, money(200000), loan.version)
        .await
        .unwrap();
    assert_eq!(approved.status(), LoanStatus::Active);

    let terms = approved.terms().unwrap();
    assert_eq!(terms.monthly_interest_rate, Decimal::new(200, 4));
    assert_eq!(terms.scheduled_installment, money(200000));
    assert_eq!(terms.minimum_principal, money(100000));

    // Disbursement hits the ledger as an outflow.
    use fund_api::domain::LedgerFilter;
    let disbursements = h
        .contribution_service
        .ledger_entries(
            fund.id,
            LedgerFilter {
                transaction_type: Some(TransactionType::Disbursement),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(disbursements.len(), 1);
    assert_eq!(disbursements[0].amount, money(1000000));
    assert_eq!(ledger_balance(&h, fund.id).await, money(-1000000));
}

#[tokio::test]
async fn approve_requires_pending_state() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;

    let loan = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await
        .unwrap();
    let approved = h
        .loan_service
        .approve_loan(loan.id, admin, money(50000), loan.version)
        .await
        .unwrap();

    let again = h
        .loan_service
        .approve_loan(loan.id, admin, money(50000), approved.version)
        .await;
    assert!(matches!(again, Err(FundError::InvalidState { .. })));
}

#[tokio::test]
async fn rejection_needs_a_reason() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;

    let loan = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await
        .unwrap();

    let empty = h
        .loan_service
        .reject_loan(loan.id, admin, "  ".to_string(), loan.version)
        .await;
    assert!(matches!(empty, Err(FundError::Validation { .. })));

    let rejected = h
        .loan_service
        .reject_loan(loan.id, admin, "pool too small".to_string(), loan.version)
        .await
        .unwrap();
    assert_eq!(rejected.status(), LoanStatus::Rejected);

    // Terminal: no approval afterwards.
    let approve = h
        .loan_service
        .approve_loan(loan.id, admin, money(50000), rejected.version)
        .await;
    assert!(matches!(approve, Err(FundError::InvalidState { .. })));
}

#[tokio::test]
async fn stale_loan_version_conflicts() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;

    let loan = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await
        .unwrap();
    let result = h
        .loan_service
        .approve_loan(loan.id, admin, money(50000), loan.version + 7)
        .await;
    assert!(matches!(result, Err(FundError::Conflict(_))));
}

#[tokio::test]
async fn member_loan_summary_tracks_open_positions() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;

    let first = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(300000)))
        .await
        .unwrap();
    h.loan_service
        .approve_loan(first.id, admin, money(150000), first.version)
        .await
        .unwrap();
    h.loan_service
        .request_loan(loan_request(fund.id, borrower, money(200000)))
        .await
        .unwrap();

    let summary = h
        .loan_service
        .member_loan_summary(fund.id, borrower)
        .await
        .unwrap();
    assert_eq!(summary.open_loans, 2);
    assert_eq!(summary.total_outstanding_principal, money(500000));
}

#[tokio::test]
async fn dissolving_fund_refuses_new_requests() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;

    use fund_api::service::FundService;
    let fund_now = h
        .fund_service
        .find_fund_by_id(fund.id)
        .await
        .unwrap()
        .unwrap();
    h.fund_service
        .initiate_dissolution(fund.id, admin, fund_now.version)
        .await
        .unwrap();

    // The projection consumed DissolutionInitiated and flipped inactive.
    let result = h
        .loan_service
        .request_loan(loan_request(fund.id, borrower, money(100000)))
        .await;
    assert!(matches!(result, Err(FundError::InvalidState { .. })));
}
