use crate::core::service::ServiceConfig;
use crate::core::tariff::TariffSchedule;
use crate::io::schedule_file::load_schedule;
use crate::rate::{DEFAULT_RATE_URL, DEFAULT_TIMEOUT};
use crate::types::{ScheduleError, UserId};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

/// Estimate the landed cost of a vehicle imported from Japan
#[derive(Parser, Debug)]
#[command(name = "import-cost")]
#[command(about = "Estimate the landed cost of a vehicle imported from Japan", long_about = None)]
pub struct CliArgs {
    /// CSV log of completed calculations
    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "IMPORT_CALC_LOG_FILE",
        default_value = "calculations.csv"
    )]
    pub log_file: PathBuf,

    /// Users allowed to export the log
    #[arg(
        long = "admin-id",
        value_name = "ID",
        env = "ADMIN_ID",
        value_delimiter = ',',
        help = "User ids allowed to run /export (comma separated)"
    )]
    pub admin_ids: Vec<UserId>,

    /// Identity of the console user
    #[arg(
        long = "user-id",
        value_name = "ID",
        env = "IMPORT_CALC_USER_ID",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub user_id: UserId,

    #[arg(
        long = "chat-id",
        value_name = "ID",
        env = "IMPORT_CALC_CHAT_ID",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub chat_id: i64,

    /// Rate document URL (JSON or XML)
    #[arg(
        long = "rate-url",
        value_name = "URL",
        env = "IMPORT_CALC_RATE_URL",
        default_value = DEFAULT_RATE_URL
    )]
    pub rate_url: String,

    #[arg(
        long = "rate-timeout",
        value_name = "SECONDS",
        env = "IMPORT_CALC_RATE_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        help = "Give up on the rate fetch after this many seconds"
    )]
    pub rate_timeout_secs: u64,

    /// Rate used when the fetch fails, instead of asking the user
    #[arg(long = "fallback-rate", value_name = "RUB_PER_JPY", env = "IMPORT_CALC_FALLBACK_RATE")]
    pub fallback_rate: Option<Decimal>,

    /// Rate used for every session; the rate source is never contacted
    #[arg(long = "rate-override", value_name = "RUB_PER_JPY", env = "IMPORT_CALC_RATE_OVERRIDE")]
    pub rate_override: Option<Decimal>,

    #[arg(
        long = "schedule",
        value_name = "PRESET",
        env = "IMPORT_CALC_SCHEDULE",
        default_value = "standard",
        help = "Built-in tariff schedule: 'standard', 'floored' or 'fixed-fee'"
    )]
    pub schedule: SchedulePreset,

    /// TOML tariff schedule; takes precedence over --schedule
    #[arg(long = "schedule-file", value_name = "PATH", env = "IMPORT_CALC_SCHEDULE_FILE")]
    pub schedule_file: Option<PathBuf>,

    /// Do not ask for delivery, freight and broker fee
    #[arg(long = "skip-logistics", env = "IMPORT_CALC_SKIP_LOGISTICS")]
    pub skip_logistics: bool,

    #[arg(
        long = "session-ttl",
        value_name = "MINUTES",
        env = "IMPORT_CALC_SESSION_TTL",
        default_value_t = 30,
        help = "Drop sessions idle for longer than this many minutes"
    )]
    pub session_ttl_mins: u64,
}

/// Built-in tariff schedules
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SchedulePreset {
    /// Percentage duty without floor, flat util fee, VAT on price and duty
    Standard,
    /// Per-cc floor on new vehicles, coefficient util fee, VAT including util fee
    Floored,
    /// Tiered duty charged at 100 per cc and coefficient
    FixedFee,
}

impl SchedulePreset {
    pub fn schedule(self) -> TariffSchedule {
        match self {
            SchedulePreset::Standard => TariffSchedule::standard(),
            SchedulePreset::Floored => TariffSchedule::floored(),
            SchedulePreset::FixedFee => TariffSchedule::fixed_fee(),
        }
    }
}

impl CliArgs {
    pub fn rate_timeout(&self) -> Duration {
        Duration::from_secs(self.rate_timeout_secs)
    }

    /// Create a ServiceConfig from CLI arguments
    ///
    /// The schedule comes from `--schedule-file` when given, otherwise from
    /// the `--schedule` preset.
    ///
    /// # Errors
    ///
    /// Returns a `ScheduleError` if the schedule file cannot be read, parsed
    /// or validated.
    pub fn to_service_config(&self) -> Result<ServiceConfig, ScheduleError> {
        let schedule = match &self.schedule_file {
            Some(path) => load_schedule(path)?,
            None => self.schedule.schedule(),
        };

        Ok(ServiceConfig {
            schedule,
            collect_logistics: !self.skip_logistics,
            session_ttl: Duration::from_secs(self.session_ttl_mins.saturating_mul(60)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults() {
        let parsed = CliArgs::try_parse_from(["program"]).unwrap();
        assert_eq!(parsed.log_file, PathBuf::from("calculations.csv"));
        assert_eq!(parsed.rate_url, DEFAULT_RATE_URL);
        assert_eq!(parsed.rate_timeout(), Duration::from_secs(8));
        assert_eq!(parsed.schedule, SchedulePreset::Standard);
        assert_eq!(parsed.fallback_rate, None);
        assert_eq!(parsed.rate_override, None);

        let config = parsed.to_service_config().unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[rstest]
    #[case::standard("standard", SchedulePreset::Standard)]
    #[case::floored("floored", SchedulePreset::Floored)]
    #[case::fixed_fee("fixed-fee", SchedulePreset::FixedFee)]
    fn test_schedule_preset_parsing(#[case] value: &str, #[case] expected: SchedulePreset) {
        let parsed = CliArgs::try_parse_from(["program", "--schedule", value]).unwrap();
        assert_eq!(parsed.schedule, expected);
        assert_eq!(
            parsed.to_service_config().unwrap().schedule,
            expected.schedule()
        );
    }

    #[rstest]
    #[case::single(&["program", "--admin-id", "42"], vec![42])]
    #[case::comma_list(&["program", "--admin-id", "42,7"], vec![42, 7])]
    #[case::repeated(&["program", "--admin-id", "42", "--admin-id", "7"], vec![42, 7])]
    fn test_admin_ids(#[case] args: &[&str], #[case] expected: Vec<UserId>) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.admin_ids, expected);
    }

    #[rstest]
    #[case::fallback(&["program", "--fallback-rate", "0.65"], Some(dec("0.65")), None)]
    #[case::pinned(&["program", "--rate-override", "0.7"], None, Some(dec("0.7")))]
    #[case::both(
        &["program", "--fallback-rate", "0.65", "--rate-override", "0.7"],
        Some(dec("0.65")),
        Some(dec("0.7"))
    )]
    fn test_rate_options(
        #[case] args: &[&str],
        #[case] fallback: Option<Decimal>,
        #[case] pinned: Option<Decimal>,
    ) {
        let parsed = CliArgs::try_parse_from(args).unwrap();
        assert_eq!(parsed.fallback_rate, fallback);
        assert_eq!(parsed.rate_override, pinned);
    }

    #[test]
    fn test_logistics_and_ttl() {
        let parsed =
            CliArgs::try_parse_from(["program", "--skip-logistics", "--session-ttl", "5"]).unwrap();
        let config = parsed.to_service_config().unwrap();
        assert!(!config.collect_logistics);
        assert_eq!(config.session_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_schedule_file_takes_precedence() {
        let mut file = NamedTempFile::new().unwrap();
        let text = toml::to_string(&TariffSchedule::fixed_fee()).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap();

        let parsed =
            CliArgs::try_parse_from(["program", "--schedule", "floored", "--schedule-file", path])
                .unwrap();

        assert_eq!(
            parsed.to_service_config().unwrap().schedule,
            TariffSchedule::fixed_fee()
        );
    }

    #[test]
    fn test_missing_schedule_file() {
        let parsed =
            CliArgs::try_parse_from(["program", "--schedule-file", "/nonexistent/schedule.toml"])
                .unwrap();
        assert!(matches!(
            parsed.to_service_config(),
            Err(ScheduleError::Read { .. })
        ));
    }

    #[rstest]
    #[case::invalid_preset(&["program", "--schedule", "cheapest"])]
    #[case::invalid_rate(&["program", "--fallback-rate", "cheap"])]
    #[case::invalid_admin(&["program", "--admin-id", "root"])]
    #[case::invalid_timeout(&["program", "--rate-timeout", "-1"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
