use crate::domain::bank::{Bank, BankId};
use crate::domain::ports::BankCatalogBox;
use crate::domain::rate::{MortgageRate, RateId, RateType};
use crate::error::{MortgageError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Effective-rate queries over the external bank catalog.
pub struct RateCatalog {
    catalog: BankCatalogBox,
}

impl RateCatalog {
    pub fn new(catalog: BankCatalogBox) -> Self {
        Self { catalog }
    }

    /// Rates effective at `now`, optionally of one type, lowest interest first.
    ///
    /// The sort is stable, so equal rates keep catalog order. Rates of
    /// inactive banks are left out.
    pub async fn effective_rates(
        &self,
        rate_type: Option<RateType>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MortgageRate>> {
        Ok(self
            .effective_offers(rate_type, now)
            .await?
            .into_iter()
            .map(|(_, rate)| rate)
            .collect())
    }

    /// Like [`RateCatalog::effective_rates`], paired with each rate's bank.
    pub async fn effective_offers(
        &self,
        rate_type: Option<RateType>,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Bank, MortgageRate)>> {
        let mut rates: Vec<MortgageRate> = self
            .catalog
            .list_rates(None)
            .await?
            .into_iter()
            .filter(|r| r.is_effective_at(now))
            .filter(|r| rate_type.is_none_or(|t| r.rate_type == t))
            .collect();
        rates.sort_by(|a, b| a.interest_rate.cmp(&b.interest_rate));

        let mut banks: HashMap<BankId, Bank> = HashMap::new();
        let mut offers = Vec::with_capacity(rates.len());
        for rate in rates {
            let bank = match banks.entry(rate.bank_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(self.bank(rate.bank_id).await?),
            };
            if bank.active {
                offers.push((bank.clone(), rate));
            }
        }
        Ok(offers)
    }

    /// Every active rate of one bank, whatever its effective window.
    pub async fn rates_for_bank(&self, bank_id: BankId) -> Result<Vec<MortgageRate>> {
        self.bank(bank_id).await?;
        Ok(self
            .catalog
            .list_rates(Some(bank_id))
            .await?
            .into_iter()
            .filter(|r| r.active)
            .collect())
    }

    /// A bank that is still taking applications. Inactive banks are `NotFound`.
    pub async fn active_bank(&self, bank_id: BankId) -> Result<Bank> {
        let bank = self.bank(bank_id).await?;
        if !bank.active {
            return Err(MortgageError::not_found("bank", bank_id));
        }
        Ok(bank)
    }

    pub async fn bank(&self, bank_id: BankId) -> Result<Bank> {
        self.catalog
            .get_bank(bank_id)
            .await?
            .ok_or_else(|| MortgageError::not_found("bank", bank_id))
    }

    pub async fn rate(&self, rate_id: RateId) -> Result<MortgageRate> {
        self.catalog
            .get_rate(rate_id)
            .await?
            .ok_or_else(|| MortgageError::not_found("rate", rate_id))
    }
}
