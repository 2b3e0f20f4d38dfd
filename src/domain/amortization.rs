//! Fixed-payment amortization math.
//!
//! Everything here is pure: no I/O, no shared state, safe to call from any
//! number of tasks at once.

use super::money::{AnnualRate, Money};
use crate::error::{MortgageError, Result};
use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;

/// Validates the shared inputs of every calculation.
fn check_inputs(principal: Money, rate: AnnualRate, term_months: u32) -> Result<()> {
    let mut errors = crate::error::ValidationErrors::new();
    if term_months == 0 {
        errors.push("term_months", "must be greater than zero");
    }
    if principal.is_negative() {
        errors.push("principal", "must not be negative");
    }
    if rate.is_negative() {
        errors.push("annual_rate", "must not be negative");
    }
    errors.into_result()
}

/// Monthly payment for a fully amortizing fixed-rate loan.
///
/// Returns the unrounded value. A zero rate yields exactly `principal / term`.
pub fn monthly_payment(principal: Money, rate: AnnualRate, term_months: u32) -> Result<Money> {
    check_inputs(principal, rate, term_months)?;

    let n = Decimal::from(term_months);
    let r = rate.monthly();
    if r.is_zero() {
        return Ok(Money::new(principal.value() / n));
    }

    let out_of_range = || MortgageError::invalid("annual_rate", "rate and term are out of range");
    let growth = (Decimal::ONE + r)
        .checked_powu(u64::from(term_months))
        .ok_or_else(out_of_range)?;
    let factor = r
        .checked_mul(growth)
        .and_then(|scaled| scaled.checked_div(growth - Decimal::ONE))
        .ok_or_else(out_of_range)?;

    principal
        .checked_mul(factor)
        .ok_or_else(|| MortgageError::invalid("principal", "amount too large"))
}

/// Returns `(total_payment, total_interest)` for a payment paid `term_months` times.
pub fn total_cost(
    principal: Money,
    monthly_payment: Money,
    term_months: u32,
) -> Result<(Money, Money)> {
    let total_payment = monthly_payment
        .checked_mul(Decimal::from(term_months))
        .ok_or_else(|| MortgageError::invalid("principal", "amount too large"))?;
    Ok((total_payment, total_payment - principal))
}

/// The cent-rounded financial snapshot of one loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanCalculation {
    pub loan_amount: Money,
    pub annual_rate: AnnualRate,
    pub term_months: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

impl LoanCalculation {
    pub fn compute(principal: Money, rate: AnnualRate, term_months: u32) -> Result<Self> {
        let payment = monthly_payment(principal, rate, term_months)?.round_cents();
        let (total_payment, total_interest) = total_cost(principal, payment, term_months)?;
        Ok(Self {
            loan_amount: principal,
            annual_rate: rate,
            term_months,
            monthly_payment: payment,
            total_payment: total_payment.round_cents(),
            total_interest: total_interest.round_cents(),
        })
    }

    pub fn schedule(&self) -> Result<PaymentSchedule> {
        schedule(self.loan_amount, self.annual_rate, self.term_months)
    }
}

/// One period of an amortization schedule. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentScheduleItem {
    pub period: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
}

/// Lazy iterator over the periods of a loan.
///
/// Yields exactly `term_months` items. Clone it to restart from period one.
/// A period never repays more than the remaining balance, so balances and
/// payments stay non-negative. Rounding drift is settled in the last period,
/// whose remaining balance is always exactly zero.
#[derive(Debug, Clone)]
pub struct PaymentSchedule {
    payment: Money,
    monthly_rate: Decimal,
    term_months: u32,
    period: u32,
    balance: Money,
}

/// Builds the schedule for `principal` at `rate` over `term_months`.
pub fn schedule(principal: Money, rate: AnnualRate, term_months: u32) -> Result<PaymentSchedule> {
    let payment = monthly_payment(principal, rate, term_months)?.round_cents();
    let monthly_rate = rate.monthly();
    // Balances only shrink, so this bounds every period's interest.
    principal
        .checked_mul(monthly_rate)
        .ok_or_else(|| MortgageError::invalid("principal", "amount too large"))?;
    Ok(PaymentSchedule {
        payment,
        monthly_rate,
        term_months,
        period: 0,
        balance: principal,
    })
}

impl PaymentSchedule {
    /// First `head` periods followed by the final one, for previews.
    pub fn preview(self, head: usize) -> Vec<PaymentScheduleItem> {
        let total = self.len();
        if total <= head.saturating_add(1) {
            return self.collect();
        }
        let mut items: Vec<PaymentScheduleItem> = Vec::with_capacity(head.saturating_add(1));
        for (index, item) in self.enumerate() {
            if index < head || index + 1 == total {
                items.push(item);
            }
        }
        items
    }
}

impl Iterator for PaymentSchedule {
    type Item = PaymentScheduleItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.period >= self.term_months {
            return None;
        }
        self.period += 1;

        // Bounded by the principal-rate product checked in `schedule`.
        let interest = Money::new(self.balance.value() * self.monthly_rate).round_cents();
        let principal = if self.period == self.term_months {
            self.balance
        } else {
            (self.payment - interest).max(Money::ZERO).min(self.balance)
        };
        let payment = principal + interest;
        self.balance -= principal;

        Some(PaymentScheduleItem {
            period: self.period,
            payment,
            principal,
            interest,
            remaining_balance: self.balance,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.term_months - self.period) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PaymentSchedule {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(v: Decimal) -> Money {
        Money::new(v)
    }

    #[test]
    fn test_reference_payment() {
        let calc = LoanCalculation::compute(
            money(dec!(3000000)),
            AnnualRate::from_percent(dec!(3.00)),
            240,
        )
        .unwrap();
        assert_eq!(calc.annual_rate.monthly(), dec!(0.0025));
        assert_eq!(calc.monthly_payment, money(dec!(16637.93)));
        assert_eq!(calc.total_payment, money(dec!(3993103.20)));
        assert_eq!(calc.total_interest, money(dec!(993103.20)));
    }

    #[test]
    fn test_zero_rate_is_straight_division() {
        let payment = monthly_payment(money(dec!(1000)), AnnualRate::ZERO, 3).unwrap();
        assert_eq!(payment, money(dec!(1000) / dec!(3)));

        let payment = monthly_payment(money(dec!(1200)), AnnualRate::ZERO, 12).unwrap();
        assert_eq!(payment, money(dec!(100)));
    }

    #[test]
    fn test_invalid_inputs() {
        let err = monthly_payment(money(dec!(1000)), AnnualRate::ZERO, 0).unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput(ref e) if e.has_field("term_months")));

        let err = monthly_payment(money(dec!(-1)), AnnualRate::ZERO, 12).unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput(ref e) if e.has_field("principal")));

        let err = schedule(money(dec!(-1)), AnnualRate::ZERO, 0).unwrap_err();
        assert!(
            matches!(err, MortgageError::InvalidInput(ref e) if e.has_field("principal") && e.has_field("term_months"))
        );
    }

    #[test]
    fn test_total_cost() {
        let (total, interest) = total_cost(money(dec!(1000)), money(dec!(90)), 12).unwrap();
        assert_eq!(total, money(dec!(1080)));
        assert_eq!(interest, money(dec!(80)));
    }

    #[test]
    fn test_huge_principal_is_invalid_input() {
        let err = LoanCalculation::compute(
            money(Decimal::MAX),
            AnnualRate::from_percent(dec!(3)),
            240,
        )
        .unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput(ref e) if e.has_field("principal")));

        let err = total_cost(Money::ZERO, money(Decimal::MAX), 2).unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput(ref e) if e.has_field("principal")));
    }

    #[test]
    fn test_huge_rate_is_invalid_input() {
        let err = LoanCalculation::compute(
            money(dec!(100000)),
            AnnualRate::from_percent(dec!(1200000)),
            9,
        )
        .unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput(ref e) if e.has_field("annual_rate")));

        let err = schedule(money(dec!(100000)), AnnualRate::from_percent(Decimal::MAX), 600)
            .unwrap_err();
        assert!(matches!(err, MortgageError::InvalidInput(_)));
    }

    #[test]
    fn test_rounded_up_payment_never_overpays() {
        // 1000 / 600 rounds up to 1.67, which clears the balance early.
        let items: Vec<_> = schedule(money(dec!(1000)), AnnualRate::ZERO, 600)
            .unwrap()
            .collect();
        assert_eq!(items.len(), 600);
        assert_eq!(items[0].payment, money(dec!(1.67)));
        for item in &items {
            assert!(!item.remaining_balance.is_negative());
            assert!(!item.payment.is_negative());
            assert!(!item.principal.is_negative());
        }
        let paid: Money = items.iter().map(|i| i.principal).sum();
        assert_eq!(paid, money(dec!(1000)));
        assert_eq!(items.last().unwrap().remaining_balance, Money::ZERO);
    }

    #[test]
    fn test_schedule_properties() {
        let cases = [
            (dec!(3000000), dec!(3.00), 240u32),
            (dec!(250000), dec!(6.875), 360),
            (dec!(1000), dec!(0), 3),
            (dec!(999.99), dec!(12.5), 7),
            (dec!(50000), dec!(2.75), 1),
        ];
        for (principal, rate, term) in cases {
            let items: Vec<_> = schedule(money(principal), AnnualRate::from_percent(rate), term)
                .unwrap()
                .collect();
            assert_eq!(items.len(), term as usize);

            let paid: Money = items.iter().map(|i| i.principal).sum();
            assert_eq!(paid, money(principal));

            let last = items.last().unwrap();
            assert_eq!(last.remaining_balance, Money::ZERO);
            assert_eq!(last.period, term);

            for item in &items {
                assert_eq!(item.payment, item.principal + item.interest);
            }
        }
    }

    #[test]
    fn test_schedule_is_restartable() {
        let sched = schedule(money(dec!(10000)), AnnualRate::from_percent(dec!(4)), 24).unwrap();
        let first: Vec<_> = sched.clone().collect();
        let second: Vec<_> = sched.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_schedule_exact_size() {
        let mut sched = schedule(money(dec!(10000)), AnnualRate::from_percent(dec!(4)), 24).unwrap();
        assert_eq!(sched.len(), 24);
        sched.next();
        assert_eq!(sched.len(), 23);
    }

    #[test]
    fn test_preview_keeps_head_and_last() {
        let sched = schedule(money(dec!(10000)), AnnualRate::from_percent(dec!(4)), 24).unwrap();
        let preview = sched.preview(12);
        assert_eq!(preview.len(), 13);
        assert_eq!(preview[11].period, 12);
        assert_eq!(preview[12].period, 24);
        assert_eq!(preview[12].remaining_balance, Money::ZERO);

        let short = schedule(money(dec!(100)), AnnualRate::ZERO, 5).unwrap();
        assert_eq!(short.preview(12).len(), 5);
    }

    #[test]
    fn test_first_period_interest_split() {
        let first = schedule(money(dec!(3000000)), AnnualRate::from_percent(dec!(3)), 240)
            .unwrap()
            .next()
            .unwrap();
        assert_eq!(first.interest, money(dec!(7500.00)));
        assert_eq!(first.principal, money(dec!(9137.93)));
        assert_eq!(first.remaining_balance, money(dec!(2990862.07)));
    }
}
