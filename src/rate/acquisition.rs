//! Rate acquisition with override, timeout and fallback
//!
//! `RateService` decides which rate a new session starts with:
//!
//! 1. an operator override, if configured (no fetch at all)
//! 2. otherwise the provider's rate, bounded by a timeout
//! 3. on any fetch failure, the configured fallback constant
//! 4. with no fallback, the session asks the user for the rate
//!
//! A fetch is attempted once per session start and never retried.

use crate::core::traits::RateProvider;
use crate::rate::cbr::DEFAULT_TIMEOUT;
use crate::types::{ExchangeRate, RateError, RateSource};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Rate a session starts with
#[derive(Debug, Clone, PartialEq)]
pub enum RateAcquisition {
    /// A usable rate (fetched, fallback or override)
    Resolved(ExchangeRate),

    /// No rate; the user must type one in
    ManualEntryRequired {
        /// Why the fetch failed
        reason: RateError,
    },
}

impl RateAcquisition {
    /// The resolved rate, `None` when manual entry is required
    pub fn rate(&self) -> Option<ExchangeRate> {
        match self {
            RateAcquisition::Resolved(rate) => Some(*rate),
            RateAcquisition::ManualEntryRequired { .. } => None,
        }
    }
}

/// Wraps a `RateProvider` with the override and fallback policy
#[derive(Clone)]
pub struct RateService {
    provider: Arc<dyn RateProvider>,
    timeout: Duration,
    fallback: Option<ExchangeRate>,
    pinned: Option<ExchangeRate>,
}

impl RateService {
    /// Create a service with the default 8 second timeout, no fallback and no override
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_TIMEOUT,
            fallback: None,
            pinned: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use `value` whenever the fetch fails
    ///
    /// # Errors
    ///
    /// Returns `RateError::NotPositive` for zero or negative values.
    pub fn with_fallback(mut self, value: Decimal) -> Result<Self, RateError> {
        self.fallback = Some(ExchangeRate::new(value, RateSource::Fallback)?);
        Ok(self)
    }

    /// Always use `value` and never contact the provider
    ///
    /// # Errors
    ///
    /// Returns `RateError::NotPositive` for zero or negative values.
    pub fn with_override(mut self, value: Decimal) -> Result<Self, RateError> {
        self.pinned = Some(ExchangeRate::new(value, RateSource::Override)?);
        Ok(self)
    }

    /// Acquire the rate for a new session
    ///
    /// Never fails and never waits longer than the timeout: every error
    /// becomes either the fallback rate or `ManualEntryRequired`.
    pub async fn acquire(&self) -> RateAcquisition {
        if let Some(rate) = self.pinned {
            return RateAcquisition::Resolved(rate);
        }

        let fetched = match tokio::time::timeout(self.timeout, self.provider.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(RateError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        };

        match fetched {
            Ok(rate) => {
                info!(rate = %rate.value, "exchange rate fetched");
                RateAcquisition::Resolved(rate)
            }
            Err(error) => match self.fallback {
                Some(rate) => {
                    warn!(%error, fallback = %rate.value, "rate fetch failed, using fallback");
                    RateAcquisition::Resolved(rate)
                }
                None => {
                    warn!(%error, "rate fetch failed, asking for manual rate");
                    RateAcquisition::ManualEntryRequired { reason: error }
                }
            },
        }
    }
}
