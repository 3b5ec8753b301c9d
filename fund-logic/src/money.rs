//! Fixed-scale decimal arithmetic for the repayment engine.
//!
//! Money is scaled to two fractional digits, rates to four. Intermediate
//! products run at full precision; banker's rounding is applied on the
//! final step only.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to money scale (2 dp, half-to-even).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Interest owed for one month on the outstanding principal.
pub fn monthly_interest(principal: Decimal, rate: Decimal) -> Decimal {
    round_money(principal * rate)
}

/// Principal portion of a monthly installment under reducing balance.
///
/// Normally `min(outstanding, max(min_principal, installment - interest))`.
/// When the installment does not even cover the interest, the floor
/// `min_principal` applies. When less than `min_principal` is outstanding,
/// the whole remainder is due (final installment).
pub fn principal_due(
    outstanding: Decimal,
    min_principal: Decimal,
    installment: Decimal,
    interest: Decimal,
) -> Decimal {
    if outstanding < min_principal {
        return round_money(outstanding);
    }
    let slack = installment - interest;
    let base = if slack <= Decimal::ZERO {
        min_principal
    } else {
        min_principal.max(slack)
    };
    round_money(outstanding.min(base))
}

/// Allocation of one payment across an entry and its loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSplit {
    pub interest_paid: Decimal,
    pub principal_paid: Decimal,
    /// Remainder applied directly against the loan's outstanding principal.
    pub excess_to_principal: Decimal,
    /// Remainder that could not be applied anywhere; callers reject
    /// payments that leave this positive.
    pub excess_not_applied: Decimal,
    pub new_outstanding: Decimal,
}

/// Split `amount` interest-first: entry interest, then entry principal due,
/// then the loan's outstanding principal directly.
pub fn apply_payment(
    amount: Decimal,
    interest_outstanding: Decimal,
    principal_due_remaining: Decimal,
    loan_outstanding: Decimal,
) -> PaymentSplit {
    let interest_paid = amount.min(interest_outstanding);
    let mut remainder = amount - interest_paid;

    let principal_paid = remainder.min(principal_due_remaining);
    remainder -= principal_paid;

    let reducible = (loan_outstanding - principal_paid).max(Decimal::ZERO);
    let excess_to_principal = remainder.min(reducible);
    let excess_not_applied = remainder - excess_to_principal;

    PaymentSplit {
        interest_paid,
        principal_paid,
        excess_to_principal,
        excess_not_applied,
        new_outstanding: loan_outstanding - principal_paid - excess_to_principal,
    }
}
