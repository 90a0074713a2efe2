//! Exchange rate module
//!
//! # Components
//!
//! - `cbr` - HTTP provider and parsers for the CBR JSON and XML documents
//! - `acquisition` - Override, timeout and fallback policy around a provider

pub mod acquisition;
pub mod cbr;

pub use acquisition::{RateAcquisition, RateService};
pub use cbr::{parse_rate_document, CbrRateProvider, DEFAULT_RATE_URL, DEFAULT_TIMEOUT};
