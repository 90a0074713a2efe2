//! Exchange rate and calculation result types
//!
//! This module defines the values that flow out of a completed conversation:
//! the exchange rate used for conversion, the gathered inputs, and the
//! immutable itemized result.

use super::error::RateError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;

/// Where an exchange rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Fetched from the remote rate source at session start
    Fetched,
    /// Typed in by the user after the fetch failed
    Manual,
    /// Configured fallback constant used after the fetch failed
    Fallback,
    /// Pinned by the operator; no fetch was attempted
    Override,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RateSource::Fetched => "fetched",
            RateSource::Manual => "manual",
            RateSource::Fallback => "fallback",
            RateSource::Override => "override",
        };
        f.write_str(label)
    }
}

/// Rubles per one yen, always positive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate {
    /// Rubles per one yen
    pub value: Decimal,

    /// How the rate was obtained
    pub source: RateSource,
}

impl ExchangeRate {
    /// Create a rate, rejecting zero and negative values
    pub fn new(value: Decimal, source: RateSource) -> Result<Self, RateError> {
        if value <= Decimal::ZERO {
            return Err(RateError::NotPositive { value });
        }
        Ok(ExchangeRate { value, source })
    }
}

/// Everything the tariff calculation needs, gathered from one session
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationInputs {
    /// Auction price in yen
    pub price_yen: Decimal,

    /// Exchange rate used to convert the price
    pub rate: ExchangeRate,

    /// Engine displacement in cubic centimeters
    pub engine_cc: u32,

    /// Model year
    pub year: i32,

    /// Vehicle age in whole years (current year minus model year)
    pub age: u32,

    /// Delivery to the Japanese port, rubles (zero when not asked)
    pub delivery: Decimal,

    /// Freight to Russia, rubles (zero when not asked)
    pub freight: Decimal,

    /// Customs broker fee, rubles (zero when not asked)
    pub broker_fee: Decimal,
}

/// Immutable itemized result of one completed calculation
///
/// Every monetary field carries full precision; rounding to two decimals
/// happens only when the result is formatted or written to the log.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationResult {
    /// The inputs the result was computed from
    pub inputs: CalculationInputs,

    /// Auction price converted to rubles
    pub price_rub: Decimal,

    /// Customs duty
    pub duty: Decimal,

    /// Recycling (utilization) fee
    pub util_fee: Decimal,

    /// Value-added tax
    pub vat: Decimal,

    /// Landed cost: price, logistics, duty, util fee, VAT and broker fee
    pub total: Decimal,

    /// Local time the calculation completed
    pub calculated_at: NaiveDateTime,
}
