//! Conversation session types
//!
//! A `Session` is the per-conversation record the state machine fills in one
//! accepted answer at a time. It never holds transport handles; it is plain
//! data that can be cloned and compared.

use super::calculation::{CalculationInputs, ExchangeRate};
use rust_decimal::Decimal;

/// Transport user identifier
pub type UserId = i64;

/// Transport chat identifier
pub type ChatId = i64;

/// Key of a session: one user in one chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationId {
    pub user: UserId,
    pub chat: ChatId,
}

impl ConversationId {
    pub fn new(user: UserId, chat: ChatId) -> Self {
        ConversationId { user, chat }
    }
}

/// Position of a session in the question sequence
///
/// The forward order is fixed:
/// `Price → [ManualRate] → Engine → Year → [Delivery → Freight → Broker] → Done`.
/// `Cancelled` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the auction price in yen
    Price,
    /// Waiting for a manually entered rate (fetch failed, no fallback)
    ManualRate,
    /// Waiting for the engine displacement
    Engine,
    /// Waiting for the model year
    Year,
    /// Waiting for the delivery cost to the Japanese port
    Delivery,
    /// Waiting for the freight cost to Russia
    Freight,
    /// Waiting for the customs broker fee
    Broker,
    /// All answers collected
    Done,
    /// Cancelled by the user
    Cancelled,
}

impl SessionState {
    /// Whether the session accepts no further answers
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Cancelled)
    }
}

/// Answers collected so far in one conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub state: SessionState,
    pub price_yen: Option<Decimal>,
    /// Present from the start unless the rate must be entered manually
    pub rate: Option<ExchangeRate>,
    pub engine_cc: Option<u32>,
    pub year: Option<i32>,
    pub age: Option<u32>,
    pub delivery: Option<Decimal>,
    pub freight: Option<Decimal>,
    pub broker_fee: Option<Decimal>,
}

impl Session {
    /// Start a session in the `Price` state
    ///
    /// # Arguments
    ///
    /// * `rate` - The rate acquired at session start, or `None` when the user
    ///   has to enter it manually after the price
    pub fn new(rate: Option<ExchangeRate>) -> Self {
        Session {
            state: SessionState::Price,
            price_yen: None,
            rate,
            engine_cc: None,
            year: None,
            age: None,
            delivery: None,
            freight: None,
            broker_fee: None,
        }
    }

    /// Gather the calculation inputs once every required answer is present
    ///
    /// Logistics fields that were never asked default to zero.
    ///
    /// # Returns
    ///
    /// `None` while price, rate, engine, year or age is still missing.
    pub fn inputs(&self) -> Option<CalculationInputs> {
        Some(CalculationInputs {
            price_yen: self.price_yen?,
            rate: self.rate?,
            engine_cc: self.engine_cc?,
            year: self.year?,
            age: self.age?,
            delivery: self.delivery.unwrap_or(Decimal::ZERO),
            freight: self.freight.unwrap_or(Decimal::ZERO),
            broker_fee: self.broker_fee.unwrap_or(Decimal::ZERO),
        })
    }
}
