use crate::application::comparator::RateComparison;
use crate::application::engine::CalculationResult;
use crate::domain::amortization::PaymentScheduleItem;
use crate::domain::money::{AnnualRate, Money};
use crate::domain::rate::MortgageRate;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct SummaryRow {
    loan_amount: Money,
    annual_rate: AnnualRate,
    term_months: u32,
    monthly_payment: Money,
    total_payment: Money,
    total_interest: Money,
}

#[derive(Serialize)]
struct RateRow<'a> {
    rate_id: u32,
    bank_id: u32,
    rate_type: &'a str,
    interest_rate: AnnualRate,
    processing_fee: Option<Money>,
    effective_date: NaiveDate,
    expiry_date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct ComparisonCsvRow<'a> {
    bank_code: &'a str,
    bank_name: &'a str,
    rate_id: u32,
    rate_type: &'a str,
    interest_rate: AnnualRate,
    monthly_payment: Money,
    total_payment: Money,
    total_interest: Money,
    total_cost: Money,
    savings_vs_lowest: Money,
    eligible: bool,
    lowest: bool,
}

/// Writes engine results as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(sink),
        }
    }

    /// A one-row summary followed by the schedule preview, under separate headers.
    pub fn write_calculation(&mut self, result: &CalculationResult) -> Result<()> {
        let calc = &result.calculation;
        self.writer.serialize(SummaryRow {
            loan_amount: calc.loan_amount,
            annual_rate: calc.annual_rate,
            term_months: calc.term_months,
            monthly_payment: calc.monthly_payment,
            total_payment: calc.total_payment,
            total_interest: calc.total_interest,
        })?;
        self.write_schedule(&result.schedule)
    }

    pub fn write_schedule(&mut self, items: &[PaymentScheduleItem]) -> Result<()> {
        self.writer
            .write_record(["period", "payment", "principal", "interest", "remaining_balance"])?;
        for item in items {
            self.writer.write_record([
                item.period.to_string(),
                item.payment.to_string(),
                item.principal.to_string(),
                item.interest.to_string(),
                item.remaining_balance.to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_rates(&mut self, rates: &[MortgageRate]) -> Result<()> {
        for rate in rates {
            self.writer.serialize(RateRow {
                rate_id: rate.id.0,
                bank_id: rate.bank_id.0,
                rate_type: rate.rate_type.as_str(),
                interest_rate: rate.interest_rate,
                processing_fee: rate.processing_fee,
                effective_date: rate.effective_date.date_naive(),
                expiry_date: rate.expiry_date.map(|d| d.date_naive()),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_comparison(&mut self, comparison: &RateComparison) -> Result<()> {
        for (index, row) in comparison.rows.iter().enumerate() {
            self.writer.serialize(ComparisonCsvRow {
                bank_code: &row.bank_code,
                bank_name: &row.bank_name,
                rate_id: row.rate_id.0,
                rate_type: row.rate_type.as_str(),
                interest_rate: row.interest_rate,
                monthly_payment: row.monthly_payment,
                total_payment: row.total_payment,
                total_interest: row.total_interest,
                total_cost: row.total_cost,
                savings_vs_lowest: row.savings_vs_lowest,
                eligible: row.violations.is_empty(),
                lowest: comparison.lowest == Some(index),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
