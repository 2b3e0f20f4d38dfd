use crate::domain::bank::Bank;
use crate::domain::money::{AnnualRate, Money};
use crate::domain::rate::{MortgageRate, RateType};
use crate::error::{MortgageError, Result};
use crate::infrastructure::in_memory::InMemoryBankCatalog;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

/// One catalog row: a rate together with the bank publishing it.
///
/// Decimal columns are kept as text and parsed explicitly so a bad value is
/// reported against its column.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct RateRecord {
    pub bank_id: u32,
    pub bank_code: String,
    pub bank_name: String,
    pub rate_id: u32,
    pub rate_type: String,
    /// Fractional annual rate, `0.025` for 2.5%.
    pub interest_rate: String,
    pub min_loan_amount: Option<String>,
    pub max_loan_amount: Option<String>,
    pub min_term_months: Option<u32>,
    pub max_term_months: Option<u32>,
    pub max_ltv: Option<String>,
    pub processing_fee: Option<String>,
    pub processing_fee_rate: Option<String>,
    pub effective_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub active: bool,
}

fn decimal(field: &'static str, value: &str) -> Result<Decimal> {
    Decimal::from_str(value.trim())
        .map_err(|e| MortgageError::invalid(field, format!("'{value}' is not a decimal: {e}")))
}

fn optional_decimal(field: &'static str, value: &Option<String>) -> Result<Option<Decimal>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => decimal(field, v).map(Some),
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

impl RateRecord {
    pub fn bank(&self) -> Bank {
        Bank::new(self.bank_id, self.bank_code.trim(), self.bank_name.trim())
    }

    pub fn to_rate(&self) -> Result<MortgageRate> {
        let rate_type = RateType::from_str(&self.rate_type)
            .map_err(|message| MortgageError::invalid("rate_type", message))?;
        let interest = decimal("interest_rate", &self.interest_rate)?;
        let interest = AnnualRate::from_fraction(interest)
            .ok_or_else(|| MortgageError::invalid("interest_rate", "value out of range"))?;

        let mut rate = MortgageRate::new(
            self.rate_id,
            self.bank_id,
            rate_type,
            interest,
            midnight(self.effective_date),
        );
        rate.min_loan_amount = optional_decimal("min_loan_amount", &self.min_loan_amount)?.map(Money::new);
        rate.max_loan_amount = optional_decimal("max_loan_amount", &self.max_loan_amount)?.map(Money::new);
        rate.min_term_months = self.min_term_months;
        rate.max_term_months = self.max_term_months;
        rate.max_ltv = optional_decimal("max_ltv", &self.max_ltv)?;
        rate.processing_fee = optional_decimal("processing_fee", &self.processing_fee)?.map(Money::new);
        rate.processing_fee_rate = optional_decimal("processing_fee_rate", &self.processing_fee_rate)?;
        rate.expiry_date = self.expiry_date.map(midnight);
        rate.active = self.active;
        Ok(rate)
    }
}

/// Reads a bank/rate catalog from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming, yielding one record per row.
pub struct CatalogReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CatalogReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes the rows.
    pub fn records(self) -> impl Iterator<Item = Result<RateRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(MortgageError::from))
    }

    /// Loads every row into a fresh in-memory catalog, in file order.
    ///
    /// Fails on the first malformed row.
    pub async fn into_catalog(self) -> Result<InMemoryBankCatalog> {
        let catalog = InMemoryBankCatalog::new();
        for record in self.records() {
            let record = record?;
            catalog.add_bank(record.bank()).await;
            catalog.add_rate(record.to_rate()?).await;
        }
        Ok(catalog)
    }
}
