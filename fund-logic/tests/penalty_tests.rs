mod common;

use chrono::NaiveDate;
use common::{default_config, harness, setup_active_fund, TestHarness};
use fund_api::{
    domain::{Loan, MonthYear, PenaltyType, RepaymentStatus},
    service::{LoanRequest, LoanService, PenaltyService, RepaymentService},
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

async fn overdue_loan(h: &TestHarness, penalty: PenaltyType, value: Decimal) -> (Uuid, Loan) {
    let admin = Uuid::new_v4();
    let borrower = Uuid::new_v4();
    let mut config = default_config();
    config.overdue_penalty_type = penalty;
    config.overdue_penalty_value = value;
    let fund = setup_active_fund(h, config, admin, &[(borrower, money(10000))]).await;

    let loan = h
        .loan_service
        .request_loan(LoanRequest {
            fund_id: fund.id,
            borrower_id: borrower,
            principal_amount: money(1000000),
            requested_start_month: MonthYear::new(2025, 3).unwrap(),
            purpose: None,
        })
        .await
        .unwrap();
    let loan = h
        .loan_service
        .approve_loan(loan.id, admin, money(200000), loan.version)
        .await
        .unwrap();

    // March entry left unpaid and swept Overdue.
    h.repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 3).unwrap())
        .await
        .unwrap();
    h.repayment_service
        .mark_overdue(fund.id, NaiveDate::from_ymd_opt(2025, 4, 2).unwrap())
        .await
        .unwrap();

    (fund.id, loan)
}

/// S6 variant: percentage penalty creates a penalty-only entry for the
/// next month, due on the 15th.
#[tokio::test]
async fn percentage_penalty_creates_next_month_entry() {
    let h = harness().await;
    let (fund_id, loan) = overdue_loan(&h, PenaltyType::Percentage, money(500)).await;

    let report = h
        .penalty_service
        .apply_penalties(fund_id, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap())
        .await
        .unwrap();
    assert_eq!(report.penalties_applied, 1);
    // Overdue amount is 2000.00 (200 interest + 1800 principal); 5% = 100.00.
    assert_eq!(report.total_penalty_amount, money(10000));

    let entries = h
        .repayment_service
        .find_entries_by_loan(loan.id)
        .await
        .unwrap();
    let april = entries
        .iter()
        .find(|e| e.month_year == MonthYear::new(2025, 4).unwrap())
        .expect("penalty-only entry for April");
    assert_eq!(april.interest_due, Decimal::ZERO);
    assert_eq!(april.principal_due, Decimal::ZERO);
    assert_eq!(april.total_due(), money(10000));
    assert_eq!(
        april.due_date,
        NaiveDate::from_ymd_opt(2025, 4, 15).unwrap()
    );
    assert_eq!(april.status, RepaymentStatus::Pending);
}

#[tokio::test]
async fn penalty_lands_on_existing_next_month_entry() {
    let h = harness().await;
    let (fund_id, loan) = overdue_loan(&h, PenaltyType::Percentage, money(500)).await;

    // April already has a regular entry before the penalty run.
    let april = h
        .repayment_service
        .generate_entry(loan.id, MonthYear::new(2025, 4).unwrap())
        .await
        .unwrap();
    let april_total_before = april.total_due();

    h.penalty_service
        .apply_penalties(fund_id, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap())
        .await
        .unwrap();

    let april = h
        .repayment_service
        .find_entry_by_id(april.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(april.total_due(), april_total_before + money(10000));
    // Interest/principal split is untouched; the penalty rides on top.
    assert_eq!(april.penalty_accrued, money(10000));
}

#[tokio::test]
async fn flat_penalty_uses_configured_amount() {
    let h = harness().await;
    let (fund_id, loan) = overdue_loan(&h, PenaltyType::Flat, money(7500)).await;

    let report = h
        .penalty_service
        .apply_penalties(fund_id, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap())
        .await
        .unwrap();
    assert_eq!(report.total_penalty_amount, money(7500));

    let entries = h
        .repayment_service
        .find_entries_by_loan(loan.id)
        .await
        .unwrap();
    let april = entries
        .iter()
        .find(|e| e.month_year == MonthYear::new(2025, 4).unwrap())
        .unwrap();
    assert_eq!(april.total_due(), money(7500));
}

#[tokio::test]
async fn rerun_does_not_double_apply() {
    let h = harness().await;
    let (fund_id, loan) = overdue_loan(&h, PenaltyType::Percentage, money(500)).await;
    let as_of = NaiveDate::from_ymd_opt(2025, 4, 3).unwrap();

    let first = h.penalty_service.apply_penalties(fund_id, as_of).await.unwrap();
    assert_eq!(first.penalties_applied, 1);

    let second = h.penalty_service.apply_penalties(fund_id, as_of).await.unwrap();
    assert_eq!(second.penalties_applied, 0);

    let entries = h
        .repayment_service
        .find_entries_by_loan(loan.id)
        .await
        .unwrap();
    let april = entries
        .iter()
        .find(|e| e.month_year == MonthYear::new(2025, 4).unwrap())
        .unwrap();
    assert_eq!(april.penalty_accrued, money(10000));
}

#[tokio::test]
async fn unconfigured_fund_is_a_no_op() {
    let h = harness().await;
    let (fund_id, _loan) = overdue_loan(&h, PenaltyType::None, Decimal::ZERO).await;

    let report = h
        .penalty_service
        .apply_penalties(fund_id, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap())
        .await
        .unwrap();
    assert_eq!(report.penalties_applied, 0);
    assert_eq!(report.total_penalty_amount, Decimal::ZERO);
}
