//! I/O module
//!
//! Handles user input parsing, message rendering and file formats.
//!
//! # Components
//!
//! - `input` - Locale-tolerant parsing and validation of answers
//! - `format` - Prompts, breakdowns and other user-facing text
//! - `csv_log` - Append-only CSV log of completed calculations
//! - `schedule_file` - Tariff schedules loaded from TOML

pub mod csv_log;
pub mod format;
pub mod input;
pub mod schedule_file;

pub use csv_log::{log_row, CsvResultLog, LOG_HEADER};
pub use format::{format_money, render_breakdown};
pub use input::{parse_engine_cc, parse_number, parse_positive, parse_year, MIN_MODEL_YEAR};
pub use schedule_file::{load_schedule, parse_schedule};
