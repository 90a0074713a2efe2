//! Tariff schedules loaded from TOML files

use crate::core::tariff::TariffSchedule;
use crate::types::ScheduleError;
use std::fs;
use std::path::Path;

/// Read, parse and validate a schedule file
///
/// # Errors
///
/// - `ScheduleError::Read` if the file cannot be read
/// - `ScheduleError::Parse` if it is not a valid schedule document
/// - `ScheduleError::Invalid` if the schedule is inconsistent
pub fn load_schedule(path: &Path) -> Result<TariffSchedule, ScheduleError> {
    let text = fs::read_to_string(path).map_err(|e| ScheduleError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_schedule(&text)
}

/// Parse and validate a schedule from TOML text
pub fn parse_schedule(text: &str) -> Result<TariffSchedule, ScheduleError> {
    let schedule: TariffSchedule = toml::from_str(text)?;
    schedule.validate()?;
    Ok(schedule)
}
