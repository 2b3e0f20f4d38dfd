use super::amortization::LoanCalculation;
use super::bank::BankId;
use super::money::{AnnualRate, Money};
use super::property::{PropertyId, UserId};
use super::rate::{RateId, RateType};
use super::scenario::ApplicantInfo;
use crate::error::{MortgageError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-facing application number: `{prefix}{YYYYMMDD}{6-digit suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationNumber(pub String);

impl ApplicationNumber {
    pub fn compose(prefix: &str, date: NaiveDate, suffix: u32) -> Self {
        Self(format!(
            "{prefix}{}{:06}",
            date.format("%Y%m%d"),
            suffix % 1_000_000
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Withdrawn,
    Completed,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending | ApplicationStatus::Approved)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            "completed" => Ok(ApplicationStatus::Completed),
            "cancelled" => Ok(ApplicationStatus::Cancelled),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

/// A lifecycle step requested against an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Transition {
    Approve { note: Option<String> },
    Reject { reason: String },
    Withdraw,
    Complete,
    Cancel,
}

impl Transition {
    pub fn action(&self) -> &'static str {
        match self {
            Transition::Approve { .. } => "approve",
            Transition::Reject { .. } => "reject",
            Transition::Withdraw => "withdraw",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
        }
    }

    pub fn target(&self) -> ApplicationStatus {
        match self {
            Transition::Approve { .. } => ApplicationStatus::Approved,
            Transition::Reject { .. } => ApplicationStatus::Rejected,
            Transition::Withdraw => ApplicationStatus::Withdrawn,
            Transition::Complete => ApplicationStatus::Completed,
            Transition::Cancel => ApplicationStatus::Cancelled,
        }
    }
}

/// The aggregate root: a submitted mortgage application and its frozen snapshot.
///
/// Financial fields are computed once at submission and never recomputed.
/// The interest rate is a copy, so later catalog edits leave it untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MortgageApplication {
    pub id: ApplicationId,
    pub number: ApplicationNumber,
    pub user_id: UserId,
    pub property_id: Option<PropertyId>,
    pub property_summary: Option<String>,
    pub bank_id: BankId,
    pub rate_id: RateId,
    pub rate_type: RateType,
    pub property_price: Money,
    pub down_payment: Money,
    pub loan_amount: Money,
    pub term_months: u32,
    pub interest_rate: AnnualRate,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub processing_cost: Money,
    pub applicant: ApplicantInfo,
    pub status: ApplicationStatus,
    pub rejection_reason: Option<String>,
    pub review_note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl MortgageApplication {
    /// Financial terms may only change before a lender starts reviewing.
    pub fn can_update(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    pub fn can_withdraw(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::Approved
        )
    }

    /// The stored snapshot as a calculation, for schedule rebuilding.
    pub fn calculation(&self) -> LoanCalculation {
        LoanCalculation {
            loan_amount: self.loan_amount,
            annual_rate: self.interest_rate,
            term_months: self.term_months,
            monthly_payment: self.monthly_payment,
            total_payment: self.total_payment,
            total_interest: self.total_interest,
        }
    }

    fn permits(&self, transition: &Transition) -> bool {
        match transition {
            Transition::Approve { .. } | Transition::Reject { .. } => self.can_update(),
            Transition::Withdraw => self.can_withdraw(),
            Transition::Complete | Transition::Cancel => {
                self.status == ApplicationStatus::Approved
            }
        }
    }

    /// Applies `transition` at `at`, returning the status it moved from.
    ///
    /// Only the status, the matching timestamp and the reason/note change.
    pub fn apply(&mut self, transition: Transition, at: DateTime<Utc>) -> Result<ApplicationStatus> {
        if !self.permits(&transition) {
            return Err(MortgageError::InvalidTransition {
                from: self.status.to_string(),
                action: transition.action(),
            });
        }
        if let Transition::Reject { reason } = &transition
            && reason.trim().is_empty()
        {
            return Err(MortgageError::invalid("reason", "is required"));
        }

        let previous = self.status;
        self.status = transition.target();
        match transition {
            Transition::Approve { note } => {
                self.approved_at = Some(at);
                self.review_note = note;
            }
            Transition::Reject { reason } => {
                self.rejected_at = Some(at);
                self.rejection_reason = Some(reason);
            }
            Transition::Withdraw => self.withdrawn_at = Some(at),
            Transition::Complete => self.completed_at = Some(at),
            Transition::Cancel => self.cancelled_at = Some(at),
        }
        self.updated_at = at;
        Ok(previous)
    }
}
