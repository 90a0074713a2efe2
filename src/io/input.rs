//! Parsing and validation of typed answers
//!
//! Users type numbers the way they write them: `1 200 000`, `1,200,000`,
//! `0,62`, `1.8`, `¥1200000`. This module turns such text into `Decimal`
//! values and applies the per-field range checks.
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::InputError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Oldest accepted model year
pub const MIN_MODEL_YEAR: i32 = 1980;

/// Displacements below this many units are read as liters
const LITERS_THRESHOLD: i64 = 10;

/// Exclusive lower bound of an accepted displacement, cc
const MIN_ENGINE_CC: u32 = 50;

/// Inclusive upper bound of an accepted displacement, cc
const MAX_ENGINE_CC: u32 = 15_000;

const CURRENCY_MARKERS: [&str; 7] = ["¥", "₽", "руб.", "руб", "rub", "yen", "jpy"];

/// Parse a number written with any common separator convention
///
/// Rules:
/// - whitespace (including non-breaking and thin spaces), `'` and `_` are
///   digit-group separators and are dropped
/// - when both `,` and `.` appear, whichever comes last is the decimal mark
/// - several commas (or several dots) are digit-group separators
/// - a single comma followed by exactly three digits, after a non-zero
///   integer part, is a digit-group separator; any other single comma is a
///   decimal comma
/// - a leading or trailing currency marker (`¥`, `₽`, `руб`, `rub`, `yen`,
///   `jpy`) is ignored
///
/// # Errors
///
/// Returns `InputError::NotANumber` if the remaining text is not a decimal.
pub fn parse_number(input: &str) -> Result<Decimal, InputError> {
    let stripped = strip_currency(input);
    let compact: String = stripped
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '_')
        .collect();

    let normalized = normalize_separators(&compact);
    if normalized.is_empty() {
        return Err(InputError::not_a_number(input));
    }

    Decimal::from_str(&normalized).map_err(|_| InputError::not_a_number(input))
}

fn strip_currency(input: &str) -> String {
    let mut text = input.trim().to_lowercase();
    for marker in CURRENCY_MARKERS {
        if let Some(rest) = text.strip_suffix(marker) {
            text = rest.trim_end().to_string();
        }
        if let Some(rest) = text.strip_prefix(marker) {
            text = rest.trim_start().to_string();
        }
    }
    text
}

fn normalize_separators(compact: &str) -> String {
    let commas = compact.matches(',').count();
    let dots = compact.matches('.').count();

    match (commas, dots) {
        (0, 0) | (0, 1) => compact.to_string(),
        (0, _) => compact.replace('.', ""),
        (1, 0) => {
            let (integer, fraction) = compact.split_once(',').unwrap_or((compact, ""));
            let is_grouping = fraction.len() == 3
                && fraction.chars().all(|c| c.is_ascii_digit())
                && !integer.trim_start_matches(['-', '+']).trim_start_matches('0').is_empty();
            if is_grouping {
                compact.replace(',', "")
            } else {
                compact.replace(',', ".")
            }
        }
        (_, 0) => compact.replace(',', ""),
        _ => {
            let last_comma = compact.rfind(',');
            let last_dot = compact.rfind('.');
            if last_comma > last_dot {
                compact.replace('.', "").replace(',', ".")
            } else {
                compact.replace(',', "")
            }
        }
    }
}

/// Parse a strictly positive amount (price, rate, logistics cost)
///
/// # Arguments
///
/// * `input` - The raw answer
/// * `field` - Field name used in the error message
pub fn parse_positive(input: &str, field: &str) -> Result<Decimal, InputError> {
    let value = parse_number(input)?;
    if value <= Decimal::ZERO {
        return Err(InputError::not_positive(field));
    }
    Ok(value)
}

/// Parse an engine displacement in cc
///
/// Values below 10 are taken as liters and multiplied by 1000. The result is
/// rounded to a whole cc and must lie in `(50, 15000]`.
pub fn parse_engine_cc(input: &str) -> Result<u32, InputError> {
    let value = parse_number(input)?;
    let cc = if value < Decimal::from(LITERS_THRESHOLD) {
        value
            .checked_mul(Decimal::ONE_THOUSAND)
            .ok_or(InputError::EngineOutOfRange { cc: value })?
    } else {
        value
    };
    let cc = cc.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    match cc.to_u32() {
        Some(whole) if whole > MIN_ENGINE_CC && whole <= MAX_ENGINE_CC => Ok(whole),
        _ => Err(InputError::EngineOutOfRange { cc }),
    }
}

/// Parse a model year and check it against `[1980, current_year]`
pub fn parse_year(input: &str, current_year: i32) -> Result<i32, InputError> {
    let value = parse_number(input)?;
    if !value.fract().is_zero() {
        return Err(InputError::FractionalYear { value });
    }

    let out_of_range = |year: i64| InputError::YearOutOfRange {
        year,
        min: MIN_MODEL_YEAR,
        max: current_year,
    };

    let year = value.to_i64().ok_or_else(|| out_of_range(i64::MAX))?;
    match i32::try_from(year) {
        Ok(year) if (MIN_MODEL_YEAR..=current_year).contains(&year) => Ok(year),
        _ => Err(out_of_range(year)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::plain("1200000", "1200000")]
    #[case::spaces("1 200 000", "1200000")]
    #[case::non_breaking_spaces("1\u{a0}200\u{a0}000", "1200000")]
    #[case::comma_groups("1,200,000", "1200000")]
    #[case::single_comma_group("1,200", "1200")]
    #[case::dot_groups("1.200.000", "1200000")]
    #[case::decimal_comma("0,62", "0.62")]
    #[case::decimal_comma_three_digits("0,612", "0.612")]
    #[case::decimal_dot("0.6123", "0.6123")]
    #[case::european("1.200.000,50", "1200000.50")]
    #[case::american("1,200,000.50", "1200000.50")]
    #[case::yen_prefix("¥1 200 000", "1200000")]
    #[case::ruble_suffix("25000 ₽", "25000")]
    #[case::word_suffix("25000 руб", "25000")]
    #[case::apostrophes("1'200'000", "1200000")]
    #[case::surrounding_whitespace("  1798\n", "1798")]
    #[case::negative("-5", "-5")]
    fn test_parse_number(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_number(input), Ok(dec(expected)));
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_spaces("   ")]
    #[case::word("twelve")]
    #[case::only_marker("¥")]
    #[case::mixed("12abc")]
    fn test_parse_number_rejects(#[case] input: &str) {
        assert!(matches!(
            parse_number(input),
            Err(InputError::NotANumber { .. })
        ));
    }

    #[rstest]
    #[case::zero("0")]
    #[case::negative("-100")]
    fn test_parse_positive_rejects(#[case] input: &str) {
        assert_eq!(
            parse_positive(input, "price"),
            Err(InputError::not_positive("price"))
        );
    }

    #[rstest]
    #[case::cc("1798", 1798)]
    #[case::liters("1.8", 1800)]
    #[case::liters_comma("1,8", 1800)]
    #[case::precise_liters("1.798", 1798)]
    #[case::grouped_cc("1,798", 1798)]
    #[case::just_above_minimum("51", 51)]
    #[case::maximum("15000", 15000)]
    #[case::small_liters("0.66", 660)]
    fn test_parse_engine_cc(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(parse_engine_cc(input), Ok(expected));
    }

    #[rstest]
    #[case::minimum_excluded("50")]
    #[case::too_large("15001")]
    #[case::zero("0")]
    #[case::negative("-1.5")]
    #[case::between_units("20")]
    #[case::huge_negative("-79228162514264337593543950335")]
    #[case::huge_negative_grouped("-10 000 000 000 000 000 000 000 000 000")]
    #[case::huge_positive("79228162514264337593543950335")]
    fn test_parse_engine_cc_rejects(#[case] input: &str) {
        assert!(matches!(
            parse_engine_cc(input),
            Err(InputError::EngineOutOfRange { .. })
        ));
    }

    #[rstest]
    #[case::oldest("1980", 1980)]
    #[case::current("2026", 2026)]
    #[case::typical("2018", 2018)]
    fn test_parse_year(#[case] input: &str, #[case] expected: i32) {
        assert_eq!(parse_year(input, 2026), Ok(expected));
    }

    #[rstest]
    #[case::too_old("1979", 1979)]
    #[case::future("2027", 2027)]
    #[case::far_future("99999999999", 99_999_999_999)]
    fn test_parse_year_out_of_range(#[case] input: &str, #[case] year: i64) {
        assert_eq!(
            parse_year(input, 2026),
            Err(InputError::YearOutOfRange {
                year,
                min: 1980,
                max: 2026
            })
        );
    }

    #[test]
    fn test_parse_year_rejects_fraction() {
        assert_eq!(
            parse_year("2018.5", 2026),
            Err(InputError::FractionalYear { value: dec("2018.5") })
        );
    }
}
