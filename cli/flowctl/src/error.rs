//! Error handling and display for the CLI.

use colored::Colorize;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Scenario {scenario} failed: {message}")]
    ScenarioFailed {
        scenario: String,
        message: String,
        /// Whether the failure came from a listener (as opposed to setup).
        listener_failure: bool,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {}", "Error:".red().bold(), err);

    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        match cli_err {
            CliError::ScenarioFailed {
                listener_failure: true,
                ..
            } => {
                eprintln!(
                    "\n{}",
                    "Hint: Run with `--handler suppress` to absorb listener failures.".yellow()
                );
            }
            CliError::Config(_) => {
                eprintln!(
                    "\n{}",
                    "Hint: Check EVENTFLOW_SUMMARY_HISTORY and EVENTFLOW_LOG_CYCLES.".yellow()
                );
            }
            _ => {}
        }
    }
}
