//! User-facing text
//!
//! Every message the calculator sends is rendered here, so the service and
//! the transports stay free of string building.

use crate::core::conversation::Prompt;
use crate::rate::RateAcquisition;
use crate::types::{CalculationResult, InputError, RateSource};
use rust_decimal::{Decimal, RoundingStrategy};

pub const HELP_TEXT: &str = "Japan import cost calculator\n\
/start - begin a new calculation\n\
/cancel - abandon the current calculation\n\
/export - download the calculation log (admins only)\n\
/help - show this message";

pub const NO_SESSION: &str = "No calculation in progress. Send /start to begin.";
pub const CANCELLED: &str = "Calculation cancelled. Send /start to begin again.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const EXPORT_DENIED: &str = "You do not have access to the calculation log.";
pub const EXPORT_MISSING: &str = "The calculation log has not been created yet.";
pub const PERSISTENCE_WARNING: &str =
    "Note: this result could not be saved to the log, but the figures above are complete.";
pub const COMPUTATION_FAILED: &str =
    "Sorry, something went wrong while calculating. Send /start to try again.";

/// Round to 2 decimals, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a monetary amount with space-grouped thousands and 2 decimals
///
/// `1411544` becomes `1 411 544.00`.
pub fn format_money(value: Decimal) -> String {
    let text = format!("{:.2}", round_money(value));
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    format!("{sign}{}.{fraction}", group_thousands(integer))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }
    grouped
}

fn format_rate(value: Decimal) -> String {
    format!(
        "{:.4}",
        value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn render_prompt(prompt: Prompt) -> String {
    match prompt {
        Prompt::Price => "Enter the auction price in yen, for example: 1200000".to_string(),
        Prompt::ManualRate => {
            "Enter the exchange rate in rubles per 1 yen, for example: 0.6123".to_string()
        }
        Prompt::Engine => {
            "Enter the engine displacement in cc (or liters), for example: 1798".to_string()
        }
        Prompt::Year { min, max } => {
            format!("Enter the model year, from {min} to {max}, for example: 2018")
        }
        Prompt::Delivery => {
            "Enter the delivery cost to the Japanese port in rubles, for example: 25000"
                .to_string()
        }
        Prompt::Freight => {
            "Enter the freight cost to Russia in rubles, for example: 45000".to_string()
        }
        Prompt::Broker => {
            "Enter the customs broker fee in rubles, for example: 15000".to_string()
        }
    }
}

/// Corrective message for a rejected answer, followed by the same question
pub fn render_retry(error: &InputError, prompt: Prompt) -> String {
    format!("Invalid answer: {error}.\n{}", render_prompt(prompt))
}

/// First line of a new session, describing the rate it will use
pub fn render_greeting(acquisition: &RateAcquisition) -> String {
    match acquisition {
        RateAcquisition::Resolved(rate) => match rate.source {
            RateSource::Fallback => format!(
                "Could not fetch the current rate, using {} RUB per 1 JPY.",
                format_rate(rate.value)
            ),
            RateSource::Override => {
                format!("Using the configured rate: {} RUB per 1 JPY.", format_rate(rate.value))
            }
            RateSource::Fetched | RateSource::Manual => {
                format!("Current rate: {} RUB per 1 JPY.", format_rate(rate.value))
            }
        },
        RateAcquisition::ManualEntryRequired { .. } => {
            "Could not fetch the current rate. You will be asked to enter it after the price."
                .to_string()
        }
    }
}

/// Itemized breakdown of a completed calculation
pub fn render_breakdown(result: &CalculationResult) -> String {
    let inputs = &result.inputs;
    let mut lines = vec![
        "Detailed calculation".to_string(),
        format!(
            "Auction price: {} JPY x {} = {} RUB",
            format_money(inputs.price_yen),
            format_rate(inputs.rate.value),
            format_money(result.price_rub)
        ),
        format!(
            "Engine: {} cc, model year {} (age {})",
            inputs.engine_cc, inputs.year, inputs.age
        ),
    ];

    if !inputs.delivery.is_zero() {
        lines.push(format!("Delivery to port: {} RUB", format_money(inputs.delivery)));
    }
    if !inputs.freight.is_zero() {
        lines.push(format!("Freight to Russia: {} RUB", format_money(inputs.freight)));
    }

    lines.push(format!("Customs duty: {} RUB", format_money(result.duty)));
    lines.push(format!("Recycling fee: {} RUB", format_money(result.util_fee)));
    lines.push(format!("VAT: {} RUB", format_money(result.vat)));

    if !inputs.broker_fee.is_zero() {
        lines.push(format!("Broker services: {} RUB", format_money(inputs.broker_fee)));
    }

    lines.push(format!("Rate source: {}", inputs.rate.source));
    lines.push(format!("Total: {} RUB", format_money(result.total)));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tariff::{calculate, TariffSchedule};
    use crate::types::{CalculationInputs, ExchangeRate, RateError};
    use chrono::NaiveDate;
    use rstest::rstest;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[rstest]
    #[case::zero("0", "0.00")]
    #[case::small("999.999", "1 000.00")]
    #[case::total("1411544", "1 411 544.00")]
    #[case::half_up("0.125", "0.13")]
    #[case::negative("-1234.5", "-1 234.50")]
    #[case::three_digits("744", "744.00")]
    fn test_format_money(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(format_money(dec(value)), expected);
    }

    #[test]
    fn test_render_retry_repeats_prompt() {
        let text = render_retry(&InputError::not_positive("price"), Prompt::Price);
        assert!(text.starts_with("Invalid answer: "));
        assert!(text.ends_with(&render_prompt(Prompt::Price)));
    }

    #[test]
    fn test_year_prompt_names_range() {
        let text = render_prompt(Prompt::Year { min: 1980, max: 2026 });
        assert!(text.contains("from 1980 to 2026"));
    }

    #[rstest]
    #[case::fetched(RateSource::Fetched, "Current rate: 0.6200")]
    #[case::fallback(RateSource::Fallback, "Could not fetch the current rate, using 0.6200")]
    #[case::pinned(RateSource::Override, "Using the configured rate: 0.6200")]
    fn test_greeting_names_rate(#[case] source: RateSource, #[case] expected: &str) {
        let rate = ExchangeRate::new(dec("0.62"), source).unwrap();
        assert!(render_greeting(&RateAcquisition::Resolved(rate)).starts_with(expected));
    }

    #[test]
    fn test_greeting_for_manual_entry() {
        let acquisition = RateAcquisition::ManualEntryRequired {
            reason: RateError::http("refused"),
        };
        assert!(render_greeting(&acquisition).contains("enter it after the price"));
    }

    #[test]
    fn test_breakdown_reference_example() {
        let inputs = CalculationInputs {
            price_yen: dec("1200000"),
            rate: ExchangeRate::new(dec("0.62"), RateSource::Fetched).unwrap(),
            engine_cc: 1798,
            year: 2024,
            age: 2,
            delivery: dec("25000"),
            freight: dec("45000"),
            broker_fee: dec("15000"),
        };
        let at = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let result = calculate(inputs, &TariffSchedule::standard(), at).unwrap();

        let text = render_breakdown(&result);
        for line in [
            "Auction price: 1 200 000.00 JPY x 0.6200 = 744 000.00 RUB",
            "Customs duty: 357 120.00 RUB",
            "Recycling fee: 5 200.00 RUB",
            "VAT: 220 224.00 RUB",
            "Broker services: 15 000.00 RUB",
            "Total: 1 411 544.00 RUB",
        ] {
            assert!(text.lines().any(|l| l == line), "missing {line:?} in\n{text}");
        }
    }
}
