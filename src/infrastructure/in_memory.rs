use crate::domain::application::{
    ApplicationId, ApplicationNumber, ApplicationStatus, MortgageApplication,
};
use crate::domain::bank::{Bank, BankId};
use crate::domain::ports::{ApplicationStore, BankCatalog, PropertyCatalog};
use crate::domain::property::{PropertyId, PropertySummary, UserId};
use crate::domain::rate::{MortgageRate, RateId};
use crate::error::{MortgageError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct CatalogData {
    banks: HashMap<BankId, Bank>,
    rates: Vec<MortgageRate>,
}

/// A thread-safe in-memory bank and rate catalog.
///
/// Rates keep their insertion order, which is the catalog order used for
/// tie-breaking. Re-adding a rate id replaces it in place.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBankCatalog {
    data: Arc<RwLock<CatalogData>>,
}

impl InMemoryBankCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_bank(&self, bank: Bank) {
        let mut data = self.data.write().await;
        data.banks.insert(bank.id, bank);
    }

    pub async fn add_rate(&self, rate: MortgageRate) {
        let mut data = self.data.write().await;
        match data.rates.iter_mut().find(|r| r.id == rate.id) {
            Some(existing) => *existing = rate,
            None => data.rates.push(rate),
        }
    }
}

#[async_trait]
impl BankCatalog for InMemoryBankCatalog {
    async fn get_bank(&self, id: BankId) -> Result<Option<Bank>> {
        let data = self.data.read().await;
        Ok(data.banks.get(&id).cloned())
    }

    async fn get_rate(&self, id: RateId) -> Result<Option<MortgageRate>> {
        let data = self.data.read().await;
        Ok(data.rates.iter().find(|r| r.id == id).cloned())
    }

    async fn list_rates(&self, bank_id: Option<BankId>) -> Result<Vec<MortgageRate>> {
        let data = self.data.read().await;
        Ok(data
            .rates
            .iter()
            .filter(|r| bank_id.is_none_or(|id| r.bank_id == id))
            .cloned()
            .collect())
    }
}

/// In-memory property lookup.
#[derive(Default, Clone)]
pub struct InMemoryPropertyCatalog {
    properties: Arc<RwLock<HashMap<PropertyId, PropertySummary>>>,
}

impl InMemoryPropertyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, property: PropertySummary) {
        let mut properties = self.properties.write().await;
        properties.insert(property.id, property);
    }
}

#[async_trait]
impl PropertyCatalog for InMemoryPropertyCatalog {
    async fn get_property(&self, id: PropertyId) -> Result<Option<PropertySummary>> {
        let properties = self.properties.read().await;
        Ok(properties.get(&id).cloned())
    }
}

#[derive(Default)]
struct ApplicationTable {
    rows: HashMap<ApplicationId, MortgageApplication>,
    numbers: HashMap<ApplicationNumber, ApplicationId>,
}

/// A thread-safe in-memory application store.
///
/// The number index acts as the uniqueness constraint; the write lock makes
/// the check-then-write of `insert` and `update_if_status` atomic.
#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    table: Arc<RwLock<ApplicationTable>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert(&self, application: MortgageApplication) -> Result<()> {
        let mut table = self.table.write().await;
        if table.numbers.contains_key(&application.number) {
            return Err(MortgageError::Conflict(format!(
                "application number {} already exists",
                application.number
            )));
        }
        if table.rows.contains_key(&application.id) {
            return Err(MortgageError::Conflict(format!(
                "application {} already exists",
                application.id
            )));
        }
        table
            .numbers
            .insert(application.number.clone(), application.id);
        table.rows.insert(application.id, application);
        Ok(())
    }

    async fn get(&self, id: ApplicationId) -> Result<Option<MortgageApplication>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn get_by_number(&self, number: &ApplicationNumber) -> Result<Option<MortgageApplication>> {
        let table = self.table.read().await;
        Ok(table
            .numbers
            .get(number)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<MortgageApplication>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_if_status(
        &self,
        application: MortgageApplication,
        expected: ApplicationStatus,
    ) -> Result<bool> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&application.id) {
            Some(stored) if stored.status == expected => {
                *stored = application;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
