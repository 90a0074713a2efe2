// CLI module
// Command-line interface, argument parsing and the console transport

mod args;
mod console;

pub use args::{CliArgs, SchedulePreset};
pub use console::{parse_line, run_console, ConsoleLine};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (invalid arguments or --help), clap displays an error
/// message or help text and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
