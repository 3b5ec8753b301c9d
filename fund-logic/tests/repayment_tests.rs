mod common;

use chrono::NaiveDate;
use common::{default_config, harness, ledger_balance, setup_active_fund, TestHarness};
use fund_api::{
    domain::{Loan, LoanStatus, MonthYear, RepaymentStatus, TransactionType},
    service::{
        ContributionService, LoanRequest, LoanService, RecordRepaymentRequest, RepaymentService,
    },
    FundError,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Fund at 2% monthly, min principal 1000.00; borrower holds an active
/// 10000.00 loan with a 2000.00 installment.
async fn active_loan(h: &TestHarness) -> (Uuid, Loan, Uuid) {
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(h, default_config(), admin, &[(borrower, money(10000))]).await;
    let loan = h
        .loan_service
        .request_loan(LoanRequest {
            fund_id: fund.id,
            borrower_id: borrower,
            principal_amount: money(1000000),
            requested_start_month: MonthYear::new(2025, 2).unwrap(),
            purpose: None,
        })
        .await
        .unwrap();
    let loan = h
        .loan_service
        .approve_loan(loan.id, admin, money(200000), loan.version)
        .await
        .unwrap();
    (fund.id, loan, admin)
}

/// S2: interest 200.00, principal due 1800.00, 2500.00 payment splits
/// 200/1800/500 and drops the outstanding principal to 7700.00.
#[tokio::test]
async fn reducing_balance_loan_math() {
    let h = harness().await;
    let (fund_id, loan, admin) = active_loan(&h).await;
    let month = MonthYear::new(2025, 2).unwrap();

    let entry = h
        .repayment_service
        .generate_entry(loan.id, month)
        .await
        .unwrap();
    assert_eq!(entry.interest_due, money(20000));
    assert_eq!(entry.principal_due, money(180000));
    assert_eq!(entry.total_due(), money(200000));
    assert_eq!(
        entry.due_date,
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
    );

    let receipt = h
        .repayment_service
        .record_payment(RecordRepaymentRequest {
            entry_id: entry.id,
            amount: money(250000),
            idempotency_key: "rp1".to_string(),
            expected_version: entry.version,
            recorded_by: admin,
        })
        .await
        .unwrap();

    assert_eq!(receipt.interest_paid, money(20000));
    assert_eq!(receipt.principal_paid, money(180000));
    assert_eq!(receipt.excess_to_principal, money(50000));
    assert_eq!(receipt.new_outstanding_principal, money(770000));
    assert_eq!(receipt.entry_status, RepaymentStatus::Paid);
    assert!(!receipt.loan_closed);

    // Allocation totals: interest + principal + excess == amount.
    assert_eq!(
        receipt.interest_paid + receipt.principal_paid + receipt.excess_to_principal,
        money(250000)
    );

    let loan = h
        .loan_service
        .find_loan_by_id(loan.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loan.outstanding_principal, money(770000));

    // The cash lands as Repayment, the interest separately as income.
    use fund_api::domain::LedgerFilter;
    let repayments = h
        .contribution_service
        .ledger_entries(
            fund_id,
            LedgerFilter {
                transaction_type: Some(TransactionType::Repayment),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(repayments.len(), 1);
    assert_eq!(repayments[0].amount, money(250000));

    assert_eq!(
        h.contribution_service.interest_pool(fund_id).await.unwrap(),
        money(20000)
    );
    // balance = -1000000 (disbursement) + 250000 + 20000
    assert_eq!(ledger_balance(&h, fund_id).await, money(-730000));
}

#[tokio::test]
async fn entry_generation_is_idempotent() {
    let h = harness().await;
    let (_fund_id, loan, _admin) = active_loan(&h).await;
    let month = MonthYear::new(2025, 2).unwrap();

    let first = h
        .repayment_service
        .generate_entry(loan.id, month)
        .await
        .unwrap();
    let second = h
        .repayment_service
        .generate_entry(loan.id, month)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(
        h.repayment_service
            .find_entries_by_loan(loan.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn generation_requires_active_loan() {
    let h = harness().await;
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let fund = setup_active_fund(&h, default_config(), admin, &[(borrower, money(10000))]).await;
    let loan = h
        .loan_service
        .request_loan(LoanRequest {
            fund_id: fund.id,
            borrower_id: borrower,
            principal_amount: money(100000),
            requested_start_month: MonthYear::new(2025, 2).unwrap(),
            purpose: None,
        })
        .await
        .unwrap();

    let result = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 2).unwrap())
        .await;
    assert!(matches!(result, Err(FundError::InvalidState { .. })));
}

/// S4: two writers read the same version; the second commit conflicts and
/// the ledger holds exactly one Repayment transaction.
#[tokio::test]
async fn concurrent_payments_conflict_on_version() {
    let h = harness().await;
    let (fund_id, loan, admin) = active_loan(&h).await;
    let entry = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 2).unwrap())
        .await
        .unwrap();

    h.repayment_service
        .record_payment(RecordRepaymentRequest {
            entry_id: entry.id,
            amount: money(5000),
            idempotency_key: "writer-1".to_string(),
            expected_version: entry.version,
            recorded_by: admin,
        })
        .await
        .unwrap();

    let second = h
        .repayment_service
        .record_payment(RecordRepaymentRequest {
            entry_id: entry.id,
            amount: money(5000),
            idempotency_key: "writer-2".to_string(),
            expected_version: entry.version,
            recorded_by: admin,
        })
        .await;
    assert!(matches!(second, Err(FundError::Conflict(_))));

    use fund_api::domain::LedgerFilter;
    let repayments = h
        .contribution_service
        .ledger_entries(
            fund_id,
            LedgerFilter {
                transaction_type: Some(TransactionType::Repayment),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(repayments.len(), 1);
    assert_eq!(repayments[0].amount, money(5000));
}

#[tokio::test]
async fn idempotent_retry_replays_receipt() {
    let h = harness().await;
    let (_fund_id, loan, admin) = active_loan(&h).await;
    let entry = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 2).unwrap())
        .await
        .unwrap();

    let request = RecordRepaymentRequest {
        entry_id: entry.id,
        amount: money(100000),
        idempotency_key: "retry-me".to_string(),
        expected_version: entry.version,
        recorded_by: admin,
    };
    let first = h
        .repayment_service
        .record_payment(request.clone())
        .await
        .unwrap();
    let second = h.repayment_service.record_payment(request).await.unwrap();
    assert_eq!(first.transaction_id, second.transaction_id);
    assert_eq!(first.new_outstanding_principal, second.new_outstanding_principal);
}

#[tokio::test]
async fn full_repayment_closes_the_loan() {
    let h = harness().await;
    let (_fund_id, loan, admin) = active_loan(&h).await;

    // Pay the loan down month by month until the outstanding hits zero.
    let mut month = MonthYear::new(2025, 2).unwrap();
    let mut closed = false;
    for i in 0..20 {
        let entry = h
            .repayment_service
            .generate_entry(loan.id, month)
            .await
            .unwrap();
        let receipt = h
            .repayment_service
            .record_payment(RecordRepaymentRequest {
                entry_id: entry.id,
                amount: entry.total_due(),
                idempotency_key: format!("close-{i}"),
                expected_version: entry.version,
                recorded_by: admin,
            })
            .await
            .unwrap();
        if receipt.loan_closed {
            closed = true;
            break;
        }
        month = month.next();
    }
    assert!(closed, "loan should close once the principal reaches zero");

    let loan = h
        .loan_service
        .find_loan_by_id(loan.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loan.status(), LoanStatus::Closed);
    assert_eq!(loan.outstanding_principal, Decimal::ZERO);

    // A closed loan accepts no further entries or payments.
    let result = h
        .repayment_service
        .generate_entry(loan.id, month.next())
        .await;
    assert!(matches!(result, Err(FundError::InvalidState { .. })));
}

#[tokio::test]
async fn payment_beyond_loan_outstanding_is_rejected() {
    let h = harness().await;
    let (_fund_id, loan, admin) = active_loan(&h).await;
    let entry = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 2).unwrap())
        .await
        .unwrap();

    // 10000.00 outstanding + 200.00 interest is the most the loan can take.
    let result = h
        .repayment_service
        .record_payment(RecordRepaymentRequest {
            entry_id: entry.id,
            amount: money(1100000),
            idempotency_key: "too-much".to_string(),
            expected_version: entry.version,
            recorded_by: admin,
        })
        .await;
    assert!(matches!(result, Err(FundError::Validation { .. })));
}

#[tokio::test]
async fn overdue_sweep_marks_unpaid_entries() {
    let h = harness().await;
    let (fund_id, loan, _admin) = active_loan(&h).await;
    let entry = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 2).unwrap())
        .await
        .unwrap();

    let marked = h
        .repayment_service
        .mark_overdue(fund_id, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap())
        .await
        .unwrap();
    assert_eq!(marked, 1);

    let entry = h
        .repayment_service
        .find_entry_by_id(entry.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, RepaymentStatus::Overdue);

    // Before the due date nothing is marked.
    let earlier = h
        .repayment_service
        .mark_overdue(fund_id, NaiveDate::from_ymd_opt(2025, 2, 15).unwrap())
        .await
        .unwrap();
    assert_eq!(earlier, 0);
}

/// Ledger preservation: replaying the transaction log always reproduces
/// the running balance.
#[tokio::test]
async fn ledger_balance_is_reproducible() {
    let h = harness().await;
    let (fund_id, loan, admin) = active_loan(&h).await;
    let entry = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 2).unwrap())
        .await
        .unwrap();
    h.repayment_service
        .record_payment(RecordRepaymentRequest {
            entry_id: entry.id,
            amount: money(200000),
            idempotency_key: "lp".to_string(),
            expected_version: entry.version,
            recorded_by: admin,
        })
        .await
        .unwrap();

    use fund_api::domain::LedgerFilter;
    let all = h
        .contribution_service
        .ledger_entries(fund_id, LedgerFilter::default())
        .await
        .unwrap();
    let replayed: Decimal = all.iter().map(|t| t.signed_amount()).sum();
    assert_eq!(replayed, ledger_balance(&h, fund_id).await);
}
