#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use mortgage_engine::application::engine::MortgageEngine;
use mortgage_engine::config::EngineConfig;
use mortgage_engine::domain::bank::{Bank, BankId};
use mortgage_engine::domain::money::{AnnualRate, Money};
use mortgage_engine::domain::rate::{MortgageRate, RateId, RateType};
use mortgage_engine::domain::scenario::{ApplicantInfo, ApplicationRequest};
use mortgage_engine::infrastructure::clock::FixedClock;
use mortgage_engine::infrastructure::in_memory::{InMemoryApplicationStore, InMemoryBankCatalog};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
}

pub fn fixed_rate(id: u32, bank: u32, percent: Decimal) -> MortgageRate {
    MortgageRate::new(
        id,
        bank,
        RateType::Fixed,
        AnnualRate::from_percent(percent),
        now() - Duration::days(30),
    )
}

/// Bank A at 2.50% (rate 1) and Bank B at 2.75% (rate 2).
pub async fn two_bank_catalog() -> InMemoryBankCatalog {
    let catalog = InMemoryBankCatalog::new();
    catalog.add_bank(Bank::new(1, "BKA", "Bank A")).await;
    catalog.add_bank(Bank::new(2, "BKB", "Bank B")).await;
    catalog.add_rate(fixed_rate(2, 2, dec!(2.75))).await;
    catalog.add_rate(fixed_rate(1, 1, dec!(2.50))).await;
    catalog
}

pub async fn engine_with(store: InMemoryApplicationStore) -> MortgageEngine {
    MortgageEngine::new(
        EngineConfig::default(),
        Box::new(two_bank_catalog().await),
        Box::new(store),
    )
    .with_clock(Box::new(FixedClock(now())))
}

pub fn request(bank: u32, rate: u32) -> ApplicationRequest {
    ApplicationRequest {
        bank_id: BankId(bank),
        rate_id: RateId(rate),
        property_id: None,
        property_price: Money::new(dec!(4000000)),
        down_payment: Money::new(dec!(1000000)),
        term_months: Some(240),
        applicant: ApplicantInfo {
            name: "Wong Ka Yan".to_string(),
            phone: "5550123".to_string(),
            email: "wong@example.com".to_string(),
            monthly_income: Money::new(dec!(75000)),
            occupation: "Accountant".to_string(),
        },
    }
}
