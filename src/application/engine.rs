use super::comparator::{RateComparator, RateComparison};
use super::lifecycle::ApplicationLifecycle;
use super::rate_catalog::RateCatalog;
use crate::config::EngineConfig;
use crate::domain::amortization::{LoanCalculation, PaymentScheduleItem};
use crate::domain::application::{
    ApplicationId, ApplicationNumber, ApplicationStatus, MortgageApplication, Transition,
};
use crate::domain::bank::BankId;
use crate::domain::money::Money;
use crate::domain::ports::{ApplicationStoreBox, BankCatalogBox, ClockBox};
use crate::domain::property::UserId;
use crate::domain::rate::{MortgageRate, RateType};
use crate::domain::scenario::{ApplicationRequest, ComparisonScenario, LoanScenario};
use crate::error::{MortgageError, Result};
use crate::infrastructure::clock::SystemClock;
use serde::Serialize;
use tracing::{debug, warn};

/// A calculation together with its schedule preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub property_price: Money,
    pub down_payment: Money,
    pub calculation: LoanCalculation,
    /// Leading periods plus the final one.
    pub schedule: Vec<PaymentScheduleItem>,
}

/// Listing filter for a user's applications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    /// One-based page number; zero is read as one.
    pub page: usize,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

/// A lender-side decision on an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve { note: Option<String> },
    Reject { reason: String },
    Complete,
    Cancel,
}

impl From<ReviewDecision> for Transition {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approve { note } => Transition::Approve { note },
            ReviewDecision::Reject { reason } => Transition::Reject { reason },
            ReviewDecision::Complete => Transition::Complete,
            ReviewDecision::Cancel => Transition::Cancel,
        }
    }
}

/// The public entry point for mortgage calculation, comparison and applications.
///
/// `MortgageEngine` composes the rate catalog, the amortization math and the
/// application lifecycle. Beyond that composition it only enforces ownership.
pub struct MortgageEngine {
    config: EngineConfig,
    catalog: RateCatalog,
    lifecycle: ApplicationLifecycle,
    clock: ClockBox,
}

impl MortgageEngine {
    /// Creates a new `MortgageEngine`.
    ///
    /// # Arguments
    ///
    /// * `config` - Defaults and limits.
    /// * `catalog` - The external bank and rate catalog.
    /// * `store` - Where applications are persisted.
    pub fn new(config: EngineConfig, catalog: BankCatalogBox, store: ApplicationStoreBox) -> Self {
        let lifecycle = ApplicationLifecycle::new(store, &config);
        Self::with_lifecycle(config, catalog, lifecycle)
    }

    /// Like [`MortgageEngine::new`] but with a preconfigured lifecycle.
    pub fn with_lifecycle(
        config: EngineConfig,
        catalog: BankCatalogBox,
        lifecycle: ApplicationLifecycle,
    ) -> Self {
        Self {
            config,
            catalog: RateCatalog::new(catalog),
            lifecycle,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prices one loan at a caller-supplied rate.
    pub fn calculate(&self, scenario: &LoanScenario) -> Result<CalculationResult> {
        scenario.validate()?;
        let term = scenario
            .term_months
            .unwrap_or(self.config.default_term_months);
        let calculation =
            LoanCalculation::compute(scenario.loan_amount(), scenario.annual_rate, term)?;
        let schedule = calculation
            .schedule()?
            .preview(self.config.schedule_preview_months);
        Ok(CalculationResult {
            property_price: scenario.property_price,
            down_payment: scenario.down_payment,
            calculation,
            schedule,
        })
    }

    pub async fn list_effective_rates(
        &self,
        rate_type: Option<RateType>,
    ) -> Result<Vec<MortgageRate>> {
        self.catalog.effective_rates(rate_type, self.clock.now()).await
    }

    pub async fn rates_for_bank(&self, bank_id: BankId) -> Result<Vec<MortgageRate>> {
        self.catalog.rates_for_bank(bank_id).await
    }

    pub async fn compare_rates(&self, scenario: &ComparisonScenario) -> Result<RateComparison> {
        scenario.validate()?;
        let term = scenario
            .term_months
            .unwrap_or(self.config.default_term_months);
        RateComparator::new(&self.catalog)
            .compare(
                scenario.property_price,
                scenario.down_payment,
                term,
                scenario.rate_type,
                self.clock.now(),
            )
            .await
    }

    pub async fn submit(
        &self,
        user_id: UserId,
        request: ApplicationRequest,
    ) -> Result<MortgageApplication> {
        self.lifecycle
            .submit(&self.catalog, user_id, request, self.clock.now())
            .await
    }

    /// The user's applications, newest first, one page at a time.
    pub async fn list_applications(
        &self,
        user_id: UserId,
        filter: &ApplicationFilter,
    ) -> Result<Page<MortgageApplication>> {
        let mut applications: Vec<MortgageApplication> = self
            .lifecycle
            .list_for_user(user_id)
            .await?
            .into_iter()
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .collect();
        applications.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.number.0.cmp(&a.number.0))
        });

        let page = filter.page.max(1);
        let page_size = filter
            .page_size
            .unwrap_or(self.config.default_page_size)
            .min(self.config.max_page_size)
            .max(1);
        let total = applications.len();
        let items = applications
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Ok(Page {
            items,
            page,
            page_size,
            total,
        })
    }

    pub async fn get_application(
        &self,
        user_id: UserId,
        id: ApplicationId,
    ) -> Result<MortgageApplication> {
        let application = self.lifecycle.get(id).await?;
        Self::ensure_owner(&application, user_id)?;
        Ok(application)
    }

    pub async fn get_application_by_number(
        &self,
        user_id: UserId,
        number: &ApplicationNumber,
    ) -> Result<MortgageApplication> {
        let application = self.lifecycle.get_by_number(number).await?;
        Self::ensure_owner(&application, user_id)?;
        Ok(application)
    }

    /// Lender-side lookup by application number, without an ownership check.
    pub async fn lookup_number(&self, number: &ApplicationNumber) -> Result<MortgageApplication> {
        self.lifecycle.get_by_number(number).await
    }

    /// Full schedule rebuilt from the application's stored snapshot.
    pub async fn application_schedule(
        &self,
        user_id: UserId,
        id: ApplicationId,
    ) -> Result<Vec<PaymentScheduleItem>> {
        let application = self.get_application(user_id, id).await?;
        Ok(application.calculation().schedule()?.collect())
    }

    pub async fn withdraw_application(
        &self,
        user_id: UserId,
        id: ApplicationId,
    ) -> Result<MortgageApplication> {
        let application = self.get_application(user_id, id).await?;
        self.lifecycle
            .withdraw(application.id, self.clock.now())
            .await
    }

    /// Records a lender decision. Ownership is not checked here.
    pub async fn review_application(
        &self,
        id: ApplicationId,
        decision: ReviewDecision,
    ) -> Result<MortgageApplication> {
        debug!(application = %id, ?decision, "reviewing application");
        self.lifecycle
            .transition(id, decision.into(), self.clock.now())
            .await
    }

    fn ensure_owner(application: &MortgageApplication, user_id: UserId) -> Result<()> {
        if application.user_id != user_id {
            warn!(
                number = %application.number,
                user = %user_id,
                "application access denied to non-owner"
            );
            return Err(MortgageError::Forbidden(application.number.to_string()));
        }
        Ok(())
    }
}
