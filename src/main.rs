/// Main entry point for the price index CLI
///
/// A thin wrapper; the application logic lives in `interfaces::cli`.
use std::process::ExitCode;

use price_index::interfaces::cli;

fn main() -> ExitCode {
    cli::run()
}
