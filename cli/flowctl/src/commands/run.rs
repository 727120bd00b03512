//! Run command.

use anyhow::{Context, Result};
use clap::Args;
use eventflow_events::PublisherConfig;

use crate::error::CliError;
use crate::output::{print_report, OutputFormat};
use crate::scenario::{self, HandlerKind, Outcome, Scenario};

/// Run command.
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Scenario to run.
    #[arg(value_enum)]
    pub(super) scenario: Scenario,

    /// Exception handler for listener failures.
    #[arg(long, value_enum, default_value_t = HandlerKind::Rethrow)]
    pub(super) handler: HandlerKind,
}

impl RunCommand {
    pub fn run(self, format: OutputFormat) -> Result<()> {
        let config = PublisherConfig::from_env()
            .map_err(|e| CliError::Config(format!("{e:#}")))
            .context("Failed to load publisher configuration")?;

        let report = scenario::run(self.scenario, self.handler, &config);
        print_report(&report, format);

        if report.outcome == Outcome::Failed {
            return Err(CliError::ScenarioFailed {
                scenario: report.scenario.to_string(),
                message: report.error.clone().unwrap_or_default(),
                listener_failure: report.listener_failure,
            }
            .into());
        }

        Ok(())
    }
}
