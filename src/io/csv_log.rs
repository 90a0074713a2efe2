//! CSV result log
//!
//! This module provides `CsvResultLog`, the durable append-only log of
//! completed calculations. The file is created with a fixed header on first
//! append; every completed session adds exactly one row.
//!
//! # Concurrency
//!
//! Appends from different sessions are serialized by a mutex so rows never
//! interleave. The file is opened, appended and flushed on every call, so a
//! crash loses at most the row being written.

use crate::core::traits::ResultSink;
use crate::types::{CalculationResult, SinkError};
use csv::WriterBuilder;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Fixed header row of the log
pub const LOG_HEADER: [&str; 14] = [
    "Date",
    "PriceYen",
    "Rate",
    "PriceRub",
    "EngineCc",
    "Year",
    "Age",
    "Delivery",
    "Freight",
    "Duty",
    "UtilFee",
    "VAT",
    "BrokerFee",
    "Total",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV log of completed calculations
#[derive(Debug)]
pub struct CsvResultLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvResultLog {
    /// Create a log at `path`; nothing is written until the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvResultLog {
    fn append(&self, result: &CalculationResult) -> Result<(), SinkError> {
        // A panic in another writer cannot leave the file half-written, so a
        // poisoned lock is still safe to take.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let needs_header = fs::metadata(&self.path)
            .map(|metadata| metadata.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        if needs_header {
            writer.write_record(LOG_HEADER)?;
        }
        writer.write_record(log_row(result))?;
        writer.flush()?;

        Ok(())
    }

    fn export(&self) -> Option<PathBuf> {
        self.path.is_file().then(|| self.path.clone())
    }
}

/// Render one result as a log row, in `LOG_HEADER` order
///
/// Inputs are written as entered; computed amounts are rounded to 2 decimals.
pub fn log_row(result: &CalculationResult) -> Vec<String> {
    let inputs = &result.inputs;
    vec![
        result.calculated_at.format(DATE_FORMAT).to_string(),
        inputs.price_yen.normalize().to_string(),
        inputs.rate.value.normalize().to_string(),
        money(result.price_rub),
        inputs.engine_cc.to_string(),
        inputs.year.to_string(),
        inputs.age.to_string(),
        inputs.delivery.normalize().to_string(),
        inputs.freight.normalize().to_string(),
        money(result.duty),
        money(result.util_fee),
        money(result.vat),
        inputs.broker_fee.normalize().to_string(),
        money(result.total),
    ]
}

fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}
