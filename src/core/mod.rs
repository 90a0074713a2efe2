//! Core business logic module
//!
//! This module contains the calculator's core components:
//! - `traits` - Seams for the rate source, result sink and admin policy
//! - `tariff` - Tariff schedules and the duty, util fee and VAT calculation
//! - `conversation` - Pure question-and-answer state machine
//! - `session_store` - Concurrent session storage with idle eviction
//! - `admin` - Allow-list admin policy
//! - `service` - Event dispatcher tying everything together

pub mod admin;
pub mod conversation;
pub mod service;
pub mod session_store;
pub mod tariff;
pub mod traits;

pub use admin::AdminList;
pub use conversation::{ConversationContext, Prompt, Reply, Transition};
pub use service::{
    CalculatorService, Command, InboundEvent, Outbound, Payload, ServiceConfig,
    DEFAULT_SESSION_TTL,
};
pub use session_store::SessionStore;
pub use tariff::{calculate, DutyTier, TariffSchedule, UtilFeeSchedule};
pub use traits::{AdminPolicy, RateProvider, ResultSink};
