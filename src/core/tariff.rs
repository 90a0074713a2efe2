//! Customs duty, recycling fee and VAT calculation
//!
//! This module provides the `TariffSchedule` that carries every constant of a
//! customs schedule, and the pure functions that apply it. Nothing here touches
//! the network, the clock or a session, so every rule is unit-testable.
//!
//! # Age Brackets
//!
//! - `age < new_vehicle_age_limit` (3): a percentage of the ruble price,
//!   optionally raised to a per-cc floor
//! - `age <= mid_age_limit` (5): per-cc coefficient from the mid-age tier table
//! - older: per-cc coefficient from the (steeper) old-age tier table
//!
//! Tier upper bounds are inclusive: 1000 cc uses the `≤1000` tier.
//!
//! All arithmetic is checked `Decimal` arithmetic at full precision. Rounding
//! happens only when results are formatted.

use crate::types::{CalculationInputs, CalculationResult, CalculatorError, ScheduleError};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One displacement bracket of a duty tier table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyTier {
    /// Inclusive upper bound in cc; `None` for the last, unbounded tier
    #[serde(default)]
    pub max_cc: Option<u32>,

    /// Per-cc coefficient
    pub coefficient: Decimal,
}

impl DutyTier {
    fn bounded(max_cc: u32, coefficient: Decimal) -> Self {
        DutyTier {
            max_cc: Some(max_cc),
            coefficient,
        }
    }

    fn unbounded(coefficient: Decimal) -> Self {
        DutyTier {
            max_cc: None,
            coefficient,
        }
    }

    fn covers(&self, engine_cc: u32) -> bool {
        self.max_cc.is_none_or(|max| engine_cc <= max)
    }
}

/// How the recycling (utilization) fee is determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UtilFeeSchedule {
    /// A fixed amount per age bracket
    Flat {
        new_vehicle: Decimal,
        older: Decimal,
    },

    /// `base × coefficient`, coefficient chosen by age bracket
    Coefficient {
        base: Decimal,
        new_vehicle: Decimal,
        older: Decimal,
    },
}

/// Complete customs schedule
///
/// Deployed calculators disagree on the floor, the per-cc multiplier, the
/// util fee formula and whether VAT includes the util fee, so every one of
/// those is a field rather than a constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffSchedule {
    /// Vehicles strictly younger than this many years use the percentage rule
    pub new_vehicle_age_limit: u32,

    /// Vehicles up to and including this age use the mid-age tier table
    pub mid_age_limit: u32,

    /// Share of the ruble price charged for new vehicles
    pub new_vehicle_rate: Decimal,

    /// Optional minimum duty per cc for new vehicles
    #[serde(default)]
    pub new_vehicle_floor_per_cc: Option<Decimal>,

    /// Factor applied to `engine_cc × coefficient` for tiered duty
    pub per_cc_multiplier: Decimal,

    /// Tier table for vehicles between the two age limits
    pub mid_age_tiers: Vec<DutyTier>,

    /// Tier table for vehicles older than `mid_age_limit`
    pub old_age_tiers: Vec<DutyTier>,

    pub util_fee: UtilFeeSchedule,

    /// VAT share, 0.20
    pub vat_rate: Decimal,

    /// Whether the util fee is part of the VAT base
    pub vat_includes_util_fee: bool,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

impl TariffSchedule {
    /// Percentage duty without floor, per-cc tiers, flat util fee, VAT on
    /// price and duty only
    pub fn standard() -> Self {
        TariffSchedule {
            new_vehicle_age_limit: 3,
            mid_age_limit: 5,
            new_vehicle_rate: Decimal::new(48, 2),
            new_vehicle_floor_per_cc: None,
            per_cc_multiplier: Decimal::ONE,
            mid_age_tiers: vec![
                DutyTier::bounded(1000, Decimal::new(15, 1)),
                DutyTier::bounded(1500, Decimal::new(17, 1)),
                DutyTier::bounded(1800, Decimal::new(25, 1)),
                DutyTier::bounded(2300, Decimal::new(27, 1)),
                DutyTier::bounded(3000, Decimal::new(30, 1)),
                DutyTier::unbounded(Decimal::new(36, 1)),
            ],
            old_age_tiers: vec![
                DutyTier::bounded(1000, Decimal::new(30, 1)),
                DutyTier::bounded(1500, Decimal::new(32, 1)),
                DutyTier::bounded(1800, Decimal::new(35, 1)),
                DutyTier::bounded(2300, Decimal::new(48, 1)),
                DutyTier::bounded(3000, Decimal::new(50, 1)),
                DutyTier::unbounded(Decimal::new(57, 1)),
            ],
            util_fee: UtilFeeSchedule::Flat {
                new_vehicle: Decimal::new(5200, 0),
                older: Decimal::new(8200, 0),
            },
            vat_rate: Decimal::new(20, 2),
            vat_includes_util_fee: false,
        }
    }

    /// Standard schedule with a 3.5 per-cc floor on new vehicles, the
    /// `3400 × coefficient` util fee, and VAT that includes the util fee
    pub fn floored() -> Self {
        TariffSchedule {
            new_vehicle_floor_per_cc: Some(Decimal::new(35, 1)),
            util_fee: UtilFeeSchedule::Coefficient {
                base: Decimal::new(3400, 0),
                new_vehicle: Decimal::new(17, 2),
                older: Decimal::new(26, 2),
            },
            vat_includes_util_fee: true,
            ..Self::standard()
        }
    }

    /// Standard schedule charging 100 per cc and coefficient, as a fixed fee
    pub fn fixed_fee() -> Self {
        TariffSchedule {
            per_cc_multiplier: Decimal::new(100, 0),
            ..Self::standard()
        }
    }

    /// Check the schedule for internal consistency
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::Invalid` if:
    /// - `mid_age_limit` is below `new_vehicle_age_limit`
    /// - a tier table is empty, unsorted, or unbounded before its last tier
    /// - the last tier of a table is bounded (some displacements uncovered)
    /// - any rate or coefficient is negative
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.mid_age_limit < self.new_vehicle_age_limit {
            return Err(ScheduleError::invalid(format!(
                "mid_age_limit {} is below new_vehicle_age_limit {}",
                self.mid_age_limit, self.new_vehicle_age_limit
            )));
        }

        validate_tiers("mid_age_tiers", &self.mid_age_tiers)?;
        validate_tiers("old_age_tiers", &self.old_age_tiers)?;

        let mut amounts = vec![
            ("new_vehicle_rate", self.new_vehicle_rate),
            ("per_cc_multiplier", self.per_cc_multiplier),
            ("vat_rate", self.vat_rate),
        ];
        if let Some(floor) = self.new_vehicle_floor_per_cc {
            amounts.push(("new_vehicle_floor_per_cc", floor));
        }
        match &self.util_fee {
            UtilFeeSchedule::Flat { new_vehicle, older } => {
                amounts.push(("util_fee.new_vehicle", *new_vehicle));
                amounts.push(("util_fee.older", *older));
            }
            UtilFeeSchedule::Coefficient {
                base,
                new_vehicle,
                older,
            } => {
                amounts.push(("util_fee.base", *base));
                amounts.push(("util_fee.new_vehicle", *new_vehicle));
                amounts.push(("util_fee.older", *older));
            }
        }

        match amounts.iter().find(|(_, value)| value.is_sign_negative()) {
            Some((name, value)) => Err(ScheduleError::invalid(format!(
                "{name} must not be negative, got {value}"
            ))),
            None => Ok(()),
        }
    }

    /// Customs duty for a vehicle
    ///
    /// # Arguments
    ///
    /// * `price_rub` - Auction price converted to rubles
    /// * `age` - Vehicle age in whole years
    /// * `engine_cc` - Engine displacement in cc
    ///
    /// # Errors
    ///
    /// Returns `CalculatorError::Computation` on arithmetic overflow or when no
    /// tier covers the displacement.
    pub fn duty(
        &self,
        price_rub: Decimal,
        age: u32,
        engine_cc: u32,
    ) -> Result<Decimal, CalculatorError> {
        let cc = Decimal::from(engine_cc);

        if age < self.new_vehicle_age_limit {
            let percentage = mul(price_rub, self.new_vehicle_rate, "duty")?;
            return match self.new_vehicle_floor_per_cc {
                Some(per_cc) => Ok(percentage.max(mul(cc, per_cc, "duty floor")?)),
                None => Ok(percentage),
            };
        }

        let tiers = if age <= self.mid_age_limit {
            &self.mid_age_tiers
        } else {
            &self.old_age_tiers
        };
        let tier = tiers
            .iter()
            .find(|tier| tier.covers(engine_cc))
            .ok_or_else(|| CalculatorError::computation("duty tier lookup"))?;

        mul(mul(cc, tier.coefficient, "duty")?, self.per_cc_multiplier, "duty")
    }

    /// Recycling fee for a vehicle of the given age
    pub fn util_fee(&self, age: u32) -> Result<Decimal, CalculatorError> {
        let is_new = age < self.new_vehicle_age_limit;
        match &self.util_fee {
            UtilFeeSchedule::Flat { new_vehicle, older } => {
                Ok(if is_new { *new_vehicle } else { *older })
            }
            UtilFeeSchedule::Coefficient {
                base,
                new_vehicle,
                older,
            } => mul(*base, if is_new { *new_vehicle } else { *older }, "util fee"),
        }
    }

    /// VAT on price and duty, plus the util fee when the schedule says so
    pub fn vat(
        &self,
        price_rub: Decimal,
        duty: Decimal,
        util_fee: Decimal,
    ) -> Result<Decimal, CalculatorError> {
        let mut base = add(price_rub, duty, "vat base")?;
        if self.vat_includes_util_fee {
            base = add(base, util_fee, "vat base")?;
        }
        mul(base, self.vat_rate, "vat")
    }
}

fn validate_tiers(name: &str, tiers: &[DutyTier]) -> Result<(), ScheduleError> {
    let Some((last, bounded)) = tiers.split_last() else {
        return Err(ScheduleError::invalid(format!("{name} is empty")));
    };

    if last.max_cc.is_some() {
        return Err(ScheduleError::invalid(format!(
            "last tier of {name} must have no max_cc"
        )));
    }

    let mut previous = 0;
    for tier in bounded {
        match tier.max_cc {
            Some(max) if max > previous => previous = max,
            Some(max) => {
                return Err(ScheduleError::invalid(format!(
                    "{name} bounds must increase, {max} follows {previous}"
                )))
            }
            None => {
                return Err(ScheduleError::invalid(format!(
                    "only the last tier of {name} may omit max_cc"
                )))
            }
        }
    }

    match tiers.iter().find(|tier| tier.coefficient.is_sign_negative()) {
        Some(tier) => Err(ScheduleError::invalid(format!(
            "{name} coefficient {} must not be negative",
            tier.coefficient
        ))),
        None => Ok(()),
    }
}

fn mul(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal, CalculatorError> {
    a.checked_mul(b)
        .ok_or_else(|| CalculatorError::computation(operation))
}

fn add(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal, CalculatorError> {
    a.checked_add(b)
        .ok_or_else(|| CalculatorError::computation(operation))
}

/// Compute the itemized landed cost for a completed session
///
/// # Arguments
///
/// * `inputs` - Answers gathered by the conversation
/// * `schedule` - Tariff schedule to apply
/// * `calculated_at` - Timestamp recorded on the result
///
/// # Returns
///
/// The full-precision `CalculationResult`, or `CalculatorError::Computation`
/// if any step overflows.
pub fn calculate(
    inputs: CalculationInputs,
    schedule: &TariffSchedule,
    calculated_at: NaiveDateTime,
) -> Result<CalculationResult, CalculatorError> {
    let price_rub = mul(inputs.price_yen, inputs.rate.value, "price conversion")?;
    let duty = schedule.duty(price_rub, inputs.age, inputs.engine_cc)?;
    let util_fee = schedule.util_fee(inputs.age)?;
    let vat = schedule.vat(price_rub, duty, util_fee)?;

    let total = [
        price_rub,
        inputs.delivery,
        inputs.freight,
        duty,
        util_fee,
        vat,
        inputs.broker_fee,
    ]
    .into_iter()
    .try_fold(Decimal::ZERO, |sum, item| add(sum, item, "total"))?;

    Ok(CalculationResult {
        inputs,
        price_rub,
        duty,
        util_fee,
        vat,
        total,
        calculated_at,
    })
}
