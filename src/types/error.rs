//! Error types for the import cost engine
//!
//! This module defines all error types that can occur while collecting answers,
//! acquiring an exchange rate, computing the tariff and persisting results.
//! Errors are designed to be descriptive enough to show to the user as-is.
//!
//! # Error Categories
//!
//! - **Input Errors**: Non-numeric or out-of-range answers (always recoverable)
//! - **Rate Errors**: Network failures, timeouts, malformed rate documents
//! - **Sink Errors**: Failure to append to the result log
//! - **Schedule Errors**: Unreadable or inconsistent tariff schedule files
//! - **Computation Errors**: Arithmetic overflow inside the tariff calculation

use rust_decimal::Decimal;
use thiserror::Error;

/// Validation failure for a single answer
///
/// Every variant is recoverable: the conversation stays in the same state
/// and the user is asked again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The answer could not be read as a number
    #[error("'{input}' is not a number")]
    NotANumber {
        /// The raw answer as typed
        input: String,
    },

    /// A monetary amount or rate was zero or negative
    #[error("{field} must be greater than zero")]
    NotPositive {
        /// Name of the rejected field
        field: String,
    },

    /// The model year was not a whole number
    #[error("year must be a whole number, got {value}")]
    FractionalYear {
        /// The parsed value
        value: Decimal,
    },

    /// The model year lies outside the accepted range
    #[error("year {year} is outside {min}..={max}")]
    YearOutOfRange {
        /// The rejected year
        year: i64,
        /// Oldest accepted model year
        min: i32,
        /// Newest accepted model year (the current year)
        max: i32,
    },

    /// Engine displacement outside (50, 15000] cc after liter conversion
    #[error("engine displacement {cc} cc is outside 51..=15000")]
    EngineOutOfRange {
        /// Displacement in cubic centimeters after conversion
        cc: Decimal,
    },

    /// The session has already finished and accepts no further answers
    #[error("the calculation is already finished")]
    SessionClosed,
}

/// Failure to obtain an exchange rate from a remote source
///
/// Never fatal: the caller falls back to a configured constant or to
/// manual rate entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// Transport-level failure (DNS, TLS, connection, HTTP status)
    #[error("rate request failed: {message}")]
    Http {
        /// Description of the failure
        message: String,
    },

    /// The request did not complete within the configured timeout
    #[error("rate request timed out after {seconds}s")]
    Timeout {
        /// Timeout that elapsed, in seconds
        seconds: u64,
    },

    /// The response body could not be parsed
    #[error("malformed rate document: {message}")]
    Malformed {
        /// Description of the parse failure
        message: String,
    },

    /// The document was valid but did not contain the currency
    #[error("currency {code} not present in rate document")]
    MissingCurrency {
        /// ISO currency code that was looked up
        code: String,
    },

    /// The rate (after normalization) was zero or negative
    #[error("rate {value} is not positive")]
    NotPositive {
        /// The rejected value
        value: Decimal,
    },
}

/// Failure to persist a completed calculation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// I/O error while creating or appending to the log
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
    },

    /// CSV serialization error
    #[error("CSV write error: {message}")]
    Csv {
        /// Description of the CSV error
        message: String,
    },
}

/// Failure to load or validate a tariff schedule
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// The schedule file could not be read
    #[error("cannot read schedule {path}: {message}")]
    Read {
        /// Path of the schedule file
        path: String,
        /// Description of the I/O error
        message: String,
    },

    /// The schedule file is not valid TOML for a schedule
    #[error("cannot parse schedule: {message}")]
    Parse {
        /// Description of the parse error
        message: String,
    },

    /// The schedule parsed but is internally inconsistent
    #[error("invalid schedule: {message}")]
    Invalid {
        /// What is wrong with the schedule
        message: String,
    },
}

/// Main error type for the import cost engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculatorError {
    /// An answer failed validation
    #[error(transparent)]
    Input(#[from] InputError),

    /// The exchange rate could not be fetched
    #[error(transparent)]
    RateFetch(#[from] RateError),

    /// The result could not be persisted
    #[error(transparent)]
    Persistence(#[from] SinkError),

    /// The tariff schedule is unusable
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// A privileged command was issued by a non-admin user
    #[error("user {user} is not allowed to {action}")]
    Unauthorized {
        /// The requesting user
        user: i64,
        /// The attempted action
        action: String,
    },

    /// Arithmetic failure while computing the tariff
    #[error("calculation failed in {operation}")]
    Computation {
        /// Step of the calculation that failed
        operation: String,
    },
}

// Conversion from io::Error to SinkError
impl From<std::io::Error> for SinkError {
    fn from(error: std::io::Error) -> Self {
        SinkError::Io {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to SinkError
impl From<csv::Error> for SinkError {
    fn from(error: csv::Error) -> Self {
        SinkError::Csv {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for ScheduleError {
    fn from(error: toml::de::Error) -> Self {
        ScheduleError::Parse {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl InputError {
    /// Create a NotANumber error
    pub fn not_a_number(input: &str) -> Self {
        InputError::NotANumber {
            input: input.trim().to_string(),
        }
    }

    /// Create a NotPositive error
    pub fn not_positive(field: &str) -> Self {
        InputError::NotPositive {
            field: field.to_string(),
        }
    }
}

impl RateError {
    /// Create an Http error
    pub fn http(message: impl Into<String>) -> Self {
        RateError::Http {
            message: message.into(),
        }
    }

    /// Create a Malformed error
    pub fn malformed(message: impl Into<String>) -> Self {
        RateError::Malformed {
            message: message.into(),
        }
    }

    /// Create a MissingCurrency error
    pub fn missing_currency(code: &str) -> Self {
        RateError::MissingCurrency {
            code: code.to_string(),
        }
    }
}

impl ScheduleError {
    /// Create an Invalid error
    pub fn invalid(message: impl Into<String>) -> Self {
        ScheduleError::Invalid {
            message: message.into(),
        }
    }
}

impl CalculatorError {
    /// Create a Computation error
    pub fn computation(operation: &str) -> Self {
        CalculatorError::Computation {
            operation: operation.to_string(),
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(user: i64, action: &str) -> Self {
        CalculatorError::Unauthorized {
            user,
            action: action.to_string(),
        }
    }
}
