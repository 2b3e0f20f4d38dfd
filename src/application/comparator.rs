use super::rate_catalog::RateCatalog;
use crate::domain::amortization::LoanCalculation;
use crate::domain::bank::{Bank, BankId};
use crate::domain::money::{AnnualRate, Money};
use crate::domain::rate::{BoundViolation, MortgageRate, RateId, RateType};
use crate::error::{MortgageError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One offer priced for the compared scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonRow {
    pub bank_id: BankId,
    pub bank_name: String,
    pub bank_code: String,
    pub rate_id: RateId,
    pub rate_type: RateType,
    pub interest_rate: AnnualRate,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub processing_cost: Money,
    /// `total_payment` plus processing fees.
    pub total_cost: Money,
    /// Extra paid over the lowest-cost offer; zero for that offer.
    pub savings_vs_lowest: Money,
    /// Bounds the scenario falls outside of. Informational only.
    pub violations: Vec<BoundViolation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateComparison {
    pub loan_amount: Money,
    pub term_months: u32,
    pub rows: Vec<ComparisonRow>,
    /// Index into `rows` of the lowest total payment.
    pub lowest: Option<usize>,
}

impl RateComparison {
    pub fn lowest(&self) -> Option<&ComparisonRow> {
        self.lowest.and_then(|index| self.rows.get(index))
    }
}

/// Ranks effective offers for one loan scenario.
pub struct RateComparator<'a> {
    catalog: &'a RateCatalog,
}

impl<'a> RateComparator<'a> {
    pub fn new(catalog: &'a RateCatalog) -> Self {
        Self { catalog }
    }

    /// Prices every effective rate (optionally of one type) for the purchase.
    ///
    /// Inputs must already be validated. The lowest total payment wins; on a
    /// tie the first row in catalog order wins.
    pub async fn compare(
        &self,
        property_price: Money,
        down_payment: Money,
        term_months: u32,
        rate_type: Option<RateType>,
        now: DateTime<Utc>,
    ) -> Result<RateComparison> {
        let loan_amount = property_price - down_payment;
        let offers = self.catalog.effective_offers(rate_type, now).await?;

        let mut rows = Vec::with_capacity(offers.len());
        for (bank, rate) in &offers {
            rows.push(price_offer(bank, rate, loan_amount, property_price, term_months)?);
        }

        let lowest = lowest_index(&rows);
        if let Some(best) = lowest.map(|index| rows[index].total_payment) {
            for row in &mut rows {
                row.savings_vs_lowest = row.total_payment - best;
            }
        }

        Ok(RateComparison {
            loan_amount,
            term_months,
            rows,
            lowest,
        })
    }
}

fn price_offer(
    bank: &Bank,
    rate: &MortgageRate,
    loan_amount: Money,
    property_price: Money,
    term_months: u32,
) -> Result<ComparisonRow> {
    let calc = LoanCalculation::compute(loan_amount, rate.interest_rate, term_months)?;
    let processing_cost = rate.processing_cost(loan_amount)?;
    let total_cost = calc
        .total_payment
        .checked_add(processing_cost)
        .ok_or_else(|| MortgageError::invalid("processing_fee", "total cost is out of range"))?;
    Ok(ComparisonRow {
        bank_id: bank.id,
        bank_name: bank.name.clone(),
        bank_code: bank.code.clone(),
        rate_id: rate.id,
        rate_type: rate.rate_type,
        interest_rate: rate.interest_rate,
        loan_amount,
        monthly_payment: calc.monthly_payment,
        total_payment: calc.total_payment,
        total_interest: calc.total_interest,
        processing_cost,
        total_cost,
        savings_vs_lowest: Money::ZERO,
        violations: rate.bound_violations(loan_amount, property_price, term_months),
    })
}

/// First index holding the minimum total payment.
fn lowest_index(rows: &[ComparisonRow]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, row) in rows.iter().enumerate() {
        match best {
            Some(current) if rows[current].total_payment <= row.total_payment => {}
            _ => best = Some(index),
        }
    }
    best
}
