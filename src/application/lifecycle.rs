use super::rate_catalog::RateCatalog;
use crate::config::EngineConfig;
use crate::domain::amortization::LoanCalculation;
use crate::domain::application::{
    ApplicationId, ApplicationNumber, ApplicationStatus, MortgageApplication, Transition,
};
use crate::domain::ports::{ApplicationStoreBox, PropertyCatalogBox, SuffixSource};
use crate::domain::property::UserId;
use crate::domain::scenario::ApplicationRequest;
use crate::error::{MortgageError, Result, ValidationErrors};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

/// Default suffix supplier: a random six-digit number.
pub fn random_suffix() -> SuffixSource {
    Box::new(|| rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Owns application creation and every status change.
pub struct ApplicationLifecycle {
    store: ApplicationStoreBox,
    properties: Option<PropertyCatalogBox>,
    suffixes: SuffixSource,
    number_prefix: String,
    max_number_attempts: u32,
    default_term_months: u32,
}

impl ApplicationLifecycle {
    pub fn new(store: ApplicationStoreBox, config: &EngineConfig) -> Self {
        Self {
            store,
            properties: None,
            suffixes: random_suffix(),
            number_prefix: config.application_number_prefix.clone(),
            max_number_attempts: config.max_number_attempts,
            default_term_months: config.default_term_months,
        }
    }

    pub fn with_properties(mut self, properties: PropertyCatalogBox) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_suffixes(mut self, suffixes: SuffixSource) -> Self {
        self.suffixes = suffixes;
        self
    }

    /// Validates, snapshots and stores a new `pending` application.
    ///
    /// Every check runs before the first write, so a failed submission
    /// leaves nothing behind.
    pub async fn submit(
        &self,
        catalog: &RateCatalog,
        user_id: UserId,
        request: ApplicationRequest,
        now: DateTime<Utc>,
    ) -> Result<MortgageApplication> {
        request.validate()?;
        let term_months = request.term_months.unwrap_or(self.default_term_months);

        catalog.active_bank(request.bank_id).await?;
        let rate = catalog.rate(request.rate_id).await?;
        if rate.bank_id != request.bank_id || !rate.is_effective_at(now) {
            return Err(MortgageError::not_found("rate", request.rate_id));
        }

        let loan_amount = request.loan_amount();
        let violations = rate.bound_violations(loan_amount, request.property_price, term_months);
        if !violations.is_empty() {
            let mut errors = ValidationErrors::new();
            for violation in violations {
                errors.push("rate_id", violation.to_string());
            }
            return Err(MortgageError::InvalidInput(errors));
        }

        let calc = LoanCalculation::compute(loan_amount, rate.interest_rate, term_months)?;
        let processing_cost = rate.processing_cost(loan_amount)?;
        let property_summary = match (&self.properties, request.property_id) {
            (Some(properties), Some(id)) => properties.get_property(id).await?.map(|p| p.label()),
            _ => None,
        };

        let mut application = MortgageApplication {
            id: ApplicationId::generate(),
            number: self.next_number(now),
            user_id,
            property_id: request.property_id,
            property_summary,
            bank_id: request.bank_id,
            rate_id: rate.id,
            rate_type: rate.rate_type,
            property_price: request.property_price,
            down_payment: request.down_payment,
            loan_amount,
            term_months,
            interest_rate: rate.interest_rate,
            monthly_payment: calc.monthly_payment,
            total_payment: calc.total_payment,
            total_interest: calc.total_interest,
            processing_cost,
            applicant: request.applicant,
            status: ApplicationStatus::Pending,
            rejection_reason: None,
            review_note: None,
            submitted_at: now,
            approved_at: None,
            rejected_at: None,
            completed_at: None,
            withdrawn_at: None,
            cancelled_at: None,
            updated_at: now,
        };

        let mut attempt = 1;
        loop {
            match self.store.insert(application.clone()).await {
                Ok(()) => break,
                Err(MortgageError::Conflict(reason)) if attempt < self.max_number_attempts => {
                    warn!(attempt, %reason, "application number collision, regenerating");
                    attempt += 1;
                    application.number = self.next_number(now);
                }
                Err(MortgageError::Conflict(reason)) => {
                    warn!(attempt, %reason, "giving up on application number generation");
                    return Err(MortgageError::Conflict(format!(
                        "could not allocate a unique application number after {attempt} attempts"
                    )));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            number = %application.number,
            user = %user_id,
            bank = %application.bank_id,
            loan = %application.loan_amount,
            "mortgage application submitted"
        );
        Ok(application)
    }

    fn next_number(&self, now: DateTime<Utc>) -> ApplicationNumber {
        ApplicationNumber::compose(&self.number_prefix, now.date_naive(), (self.suffixes)())
    }

    pub async fn get(&self, id: ApplicationId) -> Result<MortgageApplication> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| MortgageError::not_found("application", id))
    }

    pub async fn get_by_number(&self, number: &ApplicationNumber) -> Result<MortgageApplication> {
        self.store
            .get_by_number(number)
            .await?
            .ok_or_else(|| MortgageError::not_found("application", number))
    }

    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<MortgageApplication>> {
        self.store.list_for_user(user_id).await
    }

    /// Applies `transition` as one conditional update.
    ///
    /// If another caller changed the status first, the update is refused and
    /// the caller gets `InvalidTransition`; refetch to see the new state.
    pub async fn transition(
        &self,
        id: ApplicationId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<MortgageApplication> {
        let mut application = self.get(id).await?;
        let action = transition.action();
        let previous = application.apply(transition, now)?;

        if !self
            .store
            .update_if_status(application.clone(), previous)
            .await?
        {
            let current = self.get(id).await?;
            debug!(
                number = %application.number,
                action,
                status = %current.status,
                "conditional update lost a race"
            );
            return Err(MortgageError::InvalidTransition {
                from: current.status.to_string(),
                action,
            });
        }

        info!(
            number = %application.number,
            from = %previous,
            to = %application.status,
            "application status changed"
        );
        Ok(application)
    }

    pub async fn approve(
        &self,
        id: ApplicationId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<MortgageApplication> {
        self.transition(id, Transition::Approve { note }, now).await
    }

    pub async fn reject(
        &self,
        id: ApplicationId,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<MortgageApplication> {
        self.transition(
            id,
            Transition::Reject {
                reason: reason.into(),
            },
            now,
        )
        .await
    }

    pub async fn withdraw(&self, id: ApplicationId, now: DateTime<Utc>) -> Result<MortgageApplication> {
        self.transition(id, Transition::Withdraw, now).await
    }

    pub async fn complete(&self, id: ApplicationId, now: DateTime<Utc>) -> Result<MortgageApplication> {
        self.transition(id, Transition::Complete, now).await
    }

    pub async fn cancel(&self, id: ApplicationId, now: DateTime<Utc>) -> Result<MortgageApplication> {
        self.transition(id, Transition::Cancel, now).await
    }
}
