//! Request structures and their explicit validation.

use super::bank::BankId;
use super::money::{AnnualRate, Money};
use super::property::PropertyId;
use super::rate::{RateId, RateType};
use crate::error::{Result, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Longest term the engine accepts, in months.
pub const MAX_TERM_MONTHS: u32 = 600;

fn check_purchase(
    errors: &mut ValidationErrors,
    property_price: Money,
    down_payment: Money,
    term_months: Option<u32>,
) {
    if property_price.value() <= rust_decimal::Decimal::ZERO {
        errors.push("property_price", "must be greater than zero");
    }
    if down_payment.is_negative() {
        errors.push("down_payment", "must not be negative");
    } else if down_payment > property_price {
        errors.push("down_payment", "must not exceed the property price");
    }
    match term_months {
        Some(0) => errors.push("term_months", "must be greater than zero"),
        Some(term) if term > MAX_TERM_MONTHS => {
            errors.push("term_months", format!("must not exceed {MAX_TERM_MONTHS}"))
        }
        _ => {}
    }
}

/// A single-rate calculation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanScenario {
    pub property_price: Money,
    pub down_payment: Money,
    /// Falls back to the configured default term when absent.
    pub term_months: Option<u32>,
    pub annual_rate: AnnualRate,
}

impl LoanScenario {
    pub fn loan_amount(&self) -> Money {
        self.property_price - self.down_payment
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        check_purchase(
            &mut errors,
            self.property_price,
            self.down_payment,
            self.term_months,
        );
        if self.annual_rate.is_negative() {
            errors.push("annual_rate", "must not be negative");
        }
        errors.into_result()
    }
}

/// A request to rank every effective rate for one purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonScenario {
    pub property_price: Money,
    pub down_payment: Money,
    pub term_months: Option<u32>,
    pub rate_type: Option<RateType>,
}

impl ComparisonScenario {
    pub fn loan_amount(&self) -> Money {
        self.property_price - self.down_payment
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        check_purchase(
            &mut errors,
            self.property_price,
            self.down_payment,
            self.term_months,
        );
        errors.into_result()
    }
}

/// Applicant details as typed at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub monthly_income: Money,
    pub occupation: String,
}

impl ApplicantInfo {
    fn check(&self, errors: &mut ValidationErrors) {
        if self.name.trim().is_empty() {
            errors.push("applicant.name", "is required");
        }
        if self.phone.trim().is_empty() {
            errors.push("applicant.phone", "is required");
        }
        if !self.email.contains('@') {
            errors.push("applicant.email", "must be an email address");
        }
        if self.monthly_income.is_negative() {
            errors.push("applicant.monthly_income", "must not be negative");
        }
    }
}

/// A submission for a specific bank rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    pub bank_id: BankId,
    pub rate_id: RateId,
    pub property_id: Option<PropertyId>,
    pub property_price: Money,
    pub down_payment: Money,
    pub term_months: Option<u32>,
    pub applicant: ApplicantInfo,
}

impl ApplicationRequest {
    pub fn loan_amount(&self) -> Money {
        self.property_price - self.down_payment
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();
        check_purchase(
            &mut errors,
            self.property_price,
            self.down_payment,
            self.term_months,
        );
        self.applicant.check(&mut errors);
        errors.into_result()
    }
}
