use crate::domain::scenario::MAX_TERM_MONTHS;
use std::env;
use std::str::FromStr;

/// Every tunable the engine reads, passed in at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Term used when a request leaves it out.
    pub default_term_months: u32,
    pub default_page_size: usize,
    pub max_page_size: usize,
    /// Leading schedule periods returned by a calculation preview.
    pub schedule_preview_months: usize,
    pub application_number_prefix: String,
    /// Attempts at generating an unused application number before giving up.
    pub max_number_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_term_months: 240,
            default_page_size: 20,
            max_page_size: 100,
            schedule_preview_months: 12,
            application_number_prefix: "MA".to_string(),
            max_number_attempts: 5,
        }
    }
}

impl EngineConfig {
    /// Reads `MORTGAGE_*` variables (after loading `.env`), keeping defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            default_term_months: parse_var("MORTGAGE_DEFAULT_TERM_MONTHS", defaults.default_term_months)?,
            default_page_size: parse_var("MORTGAGE_DEFAULT_PAGE_SIZE", defaults.default_page_size)?,
            max_page_size: parse_var("MORTGAGE_MAX_PAGE_SIZE", defaults.max_page_size)?,
            schedule_preview_months: parse_var(
                "MORTGAGE_SCHEDULE_PREVIEW_MONTHS",
                defaults.schedule_preview_months,
            )?,
            application_number_prefix: env::var("MORTGAGE_NUMBER_PREFIX")
                .unwrap_or(defaults.application_number_prefix),
            max_number_attempts: parse_var("MORTGAGE_MAX_NUMBER_ATTEMPTS", defaults.max_number_attempts)?,
        };
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.default_term_months == 0 || self.default_term_months > MAX_TERM_MONTHS {
            return Err(ConfigError::OutOfRange("MORTGAGE_DEFAULT_TERM_MONTHS"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(ConfigError::OutOfRange("MORTGAGE_DEFAULT_PAGE_SIZE"));
        }
        if self.schedule_preview_months > MAX_TERM_MONTHS as usize {
            return Err(ConfigError::OutOfRange("MORTGAGE_SCHEDULE_PREVIEW_MONTHS"));
        }
        if self.max_number_attempts == 0 {
            return Err(ConfigError::OutOfRange("MORTGAGE_MAX_NUMBER_ATTEMPTS"));
        }
        Ok(())
    }
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            log_level: env::var("MORTGAGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a valid number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}
