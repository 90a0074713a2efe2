//! Import Cost Engine Library
//! # Overview
//!
//! This library estimates the landed cost of a vehicle imported from Japan:
//! it collects the inputs through a short question-and-answer conversation,
//! converts the auction price with the current yen rate, applies the customs
//! duty, recycling fee and VAT rules, and logs every completed calculation.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (sessions, rates, results, errors)
//! - [`cli`] - CLI arguments parsing and the console transport
//! - [`core`] - Business logic components:
//!   - [`core::tariff`] - Tariff schedules and the cost calculation
//!   - [`core::conversation`] - Pure conversation state machine
//!   - [`core::session_store`] - Per-conversation session storage
//!   - [`core::service`] - Event dispatcher for transports
//! - [`rate`] - Exchange rate fetching with fallback and manual entry
//! - [`io`] - Answer parsing, message rendering, CSV log and schedule files
//!
//! # Cost Components
//!
//! - **Price**: auction price in yen times rubles per yen
//! - **Duty**: 48% of the price for vehicles under 3 years, otherwise a per-cc
//!   coefficient from the tier table for the vehicle's age bracket
//! - **Recycling fee**: fixed per age bracket, or base times coefficient
//! - **VAT**: 20% of price plus duty (plus the recycling fee, per schedule)
//! - **Logistics**: delivery, freight and broker fee, added as entered

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod rate;
pub mod types;

pub use core::{
    calculate, AdminList, CalculatorService, Command, InboundEvent, Outbound, ServiceConfig,
    TariffSchedule,
};
pub use io::CsvResultLog;
pub use rate::{CbrRateProvider, RateService};
pub use types::{
    CalculationInputs, CalculationResult, CalculatorError, ExchangeRate, RateSource, Session,
    SessionState,
};
