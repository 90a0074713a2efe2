//! Core traits for the collaborators the calculator service depends on
//!
//! This module defines the seams where the service meets the outside world:
//! the remote rate source, the durable result log and the admin check. Each
//! one is injected explicitly so tests can substitute in-memory stubs.

use crate::types::{CalculationResult, ExchangeRate, RateError, SinkError, UserId};
use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for fetching the current yen rate
///
/// Implementations return `Err` for every failure (network, timeout,
/// malformed document, missing currency) instead of panicking, and never
/// retry on their own.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Fetch rubles per one yen
    async fn fetch(&self) -> Result<ExchangeRate, RateError>;
}

/// Trait for persisting completed calculations
///
/// Implementations must serialize concurrent appends.
pub trait ResultSink: Send + Sync {
    /// Append one completed calculation, creating the log with its header if needed
    fn append(&self, result: &CalculationResult) -> Result<(), SinkError>;

    /// Location of the log for export, `None` if nothing has been written yet
    fn export(&self) -> Option<PathBuf>;
}

/// Trait for deciding whether a user may run privileged commands
pub trait AdminPolicy: Send + Sync {
    fn is_admin(&self, user: UserId) -> bool;
}
