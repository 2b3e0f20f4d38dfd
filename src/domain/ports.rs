use super::application::{ApplicationId, ApplicationNumber, ApplicationStatus, MortgageApplication};
use super::bank::{Bank, BankId};
use super::property::{PropertyId, PropertySummary, UserId};
use super::rate::{MortgageRate, RateId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only access to the external bank and rate catalog.
#[async_trait]
pub trait BankCatalog: Send + Sync {
    async fn get_bank(&self, id: BankId) -> Result<Option<Bank>>;
    async fn get_rate(&self, id: RateId) -> Result<Option<MortgageRate>>;
    /// Every rate ever published, for one bank or for all, in catalog order.
    async fn list_rates(&self, bank_id: Option<BankId>) -> Result<Vec<MortgageRate>>;
}

/// Read-only access to listed properties, used for display summaries.
#[async_trait]
pub trait PropertyCatalog: Send + Sync {
    async fn get_property(&self, id: PropertyId) -> Result<Option<PropertySummary>>;
}

/// Durable storage for applications.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Inserts a new application. Fails with `Conflict` when the id or the
    /// application number is already taken; nothing is written in that case.
    async fn insert(&self, application: MortgageApplication) -> Result<()>;
    async fn get(&self, id: ApplicationId) -> Result<Option<MortgageApplication>>;
    async fn get_by_number(&self, number: &ApplicationNumber) -> Result<Option<MortgageApplication>>;
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<MortgageApplication>>;
    /// Replaces the stored application only if its status still equals
    /// `expected`. Returns `false` when the stored status differs or the
    /// application is missing.
    async fn update_if_status(
        &self,
        application: MortgageApplication,
        expected: ApplicationStatus,
    ) -> Result<bool>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type BankCatalogBox = Box<dyn BankCatalog>;
pub type PropertyCatalogBox = Box<dyn PropertyCatalog>;
pub type ApplicationStoreBox = Box<dyn ApplicationStore>;
pub type ClockBox = Box<dyn Clock>;

/// Supplies the numeric suffix of new application numbers.
pub type SuffixSource = Box<dyn Fn() -> u32 + Send + Sync>;
