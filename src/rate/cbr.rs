//! Central Bank of Russia rate source
//!
//! Fetches the daily rate document over HTTP and extracts the yen rate.
//! Two document shapes are understood:
//!
//! - JSON (`daily_json.js` mirrors): `Valute.JPY.Value` and `Valute.JPY.Nominal`
//! - XML (`XML_daily.asp`): the `Valute` element whose `CharCode` is `JPY`,
//!   with `Value` and `Nominal` written with a decimal comma
//!
//! Both publish the price of `Nominal` yen (usually 100), so every rate is
//! normalized to rubles per one yen as `Value / Nominal`.

use crate::core::traits::RateProvider;
use crate::types::{ExchangeRate, RateError, RateSource};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_RATE_URL: &str = "https://www.cbr-xml-daily.ru/daily_json.js";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);
const CURRENCY_CODE: &str = "JPY";
const USER_AGENT: &str = concat!("import-cost-engine/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct JsonDocument {
    #[serde(rename = "Valute")]
    valute: HashMap<String, JsonValute>,
}

#[derive(Debug, Deserialize)]
struct JsonValute {
    #[serde(rename = "Value")]
    value: Option<serde_json::Value>,
    #[serde(rename = "Nominal", default)]
    nominal: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct XmlDocument {
    #[serde(rename = "Valute", default)]
    valutes: Vec<XmlValute>,
}

#[derive(Debug, Deserialize)]
struct XmlValute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal", default)]
    nominal: Option<String>,
    #[serde(rename = "Value")]
    value: String,
}

/// HTTP rate provider for the CBR daily document
#[derive(Debug, Clone)]
pub struct CbrRateProvider {
    http: Client,
    url: String,
    timeout: Duration,
}

impl CbrRateProvider {
    /// Build a provider for `url` whose requests give up after `timeout`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RateError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RateError::http(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    fn classify(&self, error: reqwest::Error) -> RateError {
        if error.is_timeout() {
            RateError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            RateError::http(error.to_string())
        }
    }
}

#[async_trait]
impl RateProvider for CbrRateProvider {
    async fn fetch(&self) -> Result<ExchangeRate, RateError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| self.classify(e))?;

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let value = parse_rate_document(&body)?;
        debug!(url = %self.url, %value, "parsed rate document");

        ExchangeRate::new(value, RateSource::Fetched)
    }
}

/// Extract rubles per one yen from a JSON or XML rate document
///
/// # Errors
///
/// - `RateError::Malformed` if the body is neither shape or a number is unreadable
/// - `RateError::MissingCurrency` if the document has no yen record
/// - `RateError::NotPositive` if the normalized rate is zero or negative
pub fn parse_rate_document(body: &str) -> Result<Decimal, RateError> {
    let body = body.trim_start_matches('\u{feff}').trim_start();

    if body.starts_with('<') {
        parse_xml_rate(body)
    } else if body.starts_with('{') {
        parse_json_rate(body)
    } else {
        Err(RateError::malformed("expected a JSON object or an XML document"))
    }
}

/// Extract the yen rate from the JSON daily document
pub fn parse_json_rate(body: &str) -> Result<Decimal, RateError> {
    let document: JsonDocument =
        serde_json::from_str(body).map_err(|e| RateError::malformed(e.to_string()))?;

    let record = document
        .valute
        .get(CURRENCY_CODE)
        .ok_or_else(|| RateError::missing_currency(CURRENCY_CODE))?;

    let value = record
        .value
        .as_ref()
        .ok_or_else(|| RateError::missing_currency(CURRENCY_CODE))
        .and_then(json_decimal)?;
    let nominal = match &record.nominal {
        Some(nominal) => json_decimal(nominal)?,
        None => Decimal::ONE,
    };

    normalize(value, nominal)
}

/// Extract the yen rate from the XML daily document
pub fn parse_xml_rate(body: &str) -> Result<Decimal, RateError> {
    let document: XmlDocument =
        quick_xml::de::from_str(body).map_err(|e| RateError::malformed(e.to_string()))?;

    let record = document
        .valutes
        .iter()
        .find(|valute| valute.char_code.trim() == CURRENCY_CODE)
        .ok_or_else(|| RateError::missing_currency(CURRENCY_CODE))?;

    let value = text_decimal(&record.value)?;
    let nominal = match &record.nominal {
        Some(nominal) => text_decimal(nominal)?,
        None => Decimal::ONE,
    };

    normalize(value, nominal)
}

fn json_decimal(value: &serde_json::Value) -> Result<Decimal, RateError> {
    match value {
        serde_json::Value::Number(number) => text_decimal(&number.to_string()),
        serde_json::Value::String(text) => text_decimal(text),
        other => Err(RateError::malformed(format!("expected a number, got {other}"))),
    }
}

fn text_decimal(text: &str) -> Result<Decimal, RateError> {
    let normalized: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .map_err(|_| RateError::malformed(format!("'{}' is not a number", text.trim())))
}

fn normalize(value: Decimal, nominal: Decimal) -> Result<Decimal, RateError> {
    if nominal <= Decimal::ZERO {
        return Err(RateError::malformed(format!("nominal {nominal} is not positive")));
    }

    let rate = value
        .checked_div(nominal)
        .ok_or_else(|| RateError::malformed("rate does not fit a decimal"))?;
    if rate <= Decimal::ZERO {
        return Err(RateError::NotPositive { value: rate });
    }
    Ok(rate)
}
