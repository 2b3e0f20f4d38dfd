use super::bank::BankId;
use super::money::{AnnualRate, Money};
use crate::error::{MortgageError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateId(pub u32);

impl fmt::Display for RateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Fixed,
    Floating,
    Hybrid,
}

impl RateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateType::Fixed => "fixed",
            RateType::Floating => "floating",
            RateType::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for RateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(RateType::Fixed),
            "floating" => Ok(RateType::Floating),
            "hybrid" => Ok(RateType::Hybrid),
            other => Err(format!("unknown rate type '{other}'")),
        }
    }
}

/// A bound on a rate's eligibility that a loan scenario falls outside of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "bound", rename_all = "snake_case")]
pub enum BoundViolation {
    BelowMinLoan { min: Money },
    AboveMaxLoan { max: Money },
    BelowMinTerm { min: u32 },
    AboveMaxTerm { max: u32 },
    AboveMaxLtv { max: Decimal, actual: Decimal },
}

impl fmt::Display for BoundViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundViolation::BelowMinLoan { min } => write!(f, "loan below minimum {min}"),
            BoundViolation::AboveMaxLoan { max } => write!(f, "loan above maximum {max}"),
            BoundViolation::BelowMinTerm { min } => write!(f, "term below minimum {min} months"),
            BoundViolation::AboveMaxTerm { max } => write!(f, "term above maximum {max} months"),
            BoundViolation::AboveMaxLtv { max, actual } => {
                write!(f, "loan-to-value {actual} above maximum {max}")
            }
        }
    }
}

/// A lender's published rate with its eligibility bounds and effective window.
///
/// Rates are never deleted. A rate leaves circulation by being deactivated or
/// by its expiry date passing, so history stays queryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortgageRate {
    pub id: RateId,
    pub bank_id: BankId,
    pub rate_type: RateType,
    pub interest_rate: AnnualRate,
    pub min_loan_amount: Option<Money>,
    pub max_loan_amount: Option<Money>,
    pub min_term_months: Option<u32>,
    pub max_term_months: Option<u32>,
    /// Maximum loan-to-value as a fraction (`0.8` = 80%).
    pub max_ltv: Option<Decimal>,
    /// Flat processing fee.
    pub processing_fee: Option<Money>,
    /// Processing fee as a fraction of the loan amount.
    pub processing_fee_rate: Option<Decimal>,
    pub effective_date: DateTime<Utc>,
    /// Exclusive end of the effective window; `None` is open-ended.
    pub expiry_date: Option<DateTime<Utc>>,
    pub active: bool,
}

impl MortgageRate {
    pub fn new(
        id: u32,
        bank_id: u32,
        rate_type: RateType,
        interest_rate: AnnualRate,
        effective_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RateId(id),
            bank_id: BankId(bank_id),
            rate_type,
            interest_rate,
            min_loan_amount: None,
            max_loan_amount: None,
            min_term_months: None,
            max_term_months: None,
            max_ltv: None,
            processing_fee: None,
            processing_fee_rate: None,
            effective_date,
            expiry_date: None,
            active: true,
        }
    }

    /// `active && effective_date <= now && (no expiry || now < expiry)`.
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && now >= self.effective_date
            && self.expiry_date.is_none_or(|expiry| now < expiry)
    }

    /// Flat fee plus the percentage fee on `loan_amount`, when present.
    pub fn processing_cost(&self, loan_amount: Money) -> Result<Money> {
        let flat = self.processing_fee.unwrap_or(Money::ZERO);
        let proportional = match self.processing_fee_rate {
            Some(rate) => loan_amount.checked_mul(rate),
            None => Some(Money::ZERO),
        };
        proportional
            .and_then(|fee| fee.checked_add(flat))
            .map(Money::round_cents)
            .ok_or_else(|| MortgageError::invalid("processing_fee", "fee is out of range"))
    }

    /// Lists every bound the scenario falls outside of. Empty means eligible.
    pub fn bound_violations(
        &self,
        loan_amount: Money,
        property_price: Money,
        term_months: u32,
    ) -> Vec<BoundViolation> {
        let mut violations = Vec::new();
        if let Some(min) = self.min_loan_amount
            && loan_amount < min
        {
            violations.push(BoundViolation::BelowMinLoan { min });
        }
        if let Some(max) = self.max_loan_amount
            && loan_amount > max
        {
            violations.push(BoundViolation::AboveMaxLoan { max });
        }
        if let Some(min) = self.min_term_months
            && term_months < min
        {
            violations.push(BoundViolation::BelowMinTerm { min });
        }
        if let Some(max) = self.max_term_months
            && term_months > max
        {
            violations.push(BoundViolation::AboveMaxTerm { max });
        }
        if let Some(max) = self.max_ltv
            && let Some(actual) = loan_amount.value().checked_div(property_price.value())
            && actual > max
        {
            violations.push(BoundViolation::AboveMaxLtv { max, actual });
        }
        violations
    }
}
