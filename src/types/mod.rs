//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `session`: Conversation identifiers, states and the session record
//! - `calculation`: Exchange rates, calculation inputs and results
//! - `error`: Error types for the import cost engine

pub mod calculation;
pub mod error;
pub mod session;

pub use calculation::{CalculationInputs, CalculationResult, ExchangeRate, RateSource};
pub use error::{CalculatorError, InputError, RateError, ScheduleError, SinkError};
pub use session::{ChatId, ConversationId, Session, SessionState, UserId};
