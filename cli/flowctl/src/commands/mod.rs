//! CLI commands.

mod run;
mod scenarios;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// flowctl - run event lifecycle scenarios and inspect their dispatch.
#[derive(Debug, Parser)]
#[command(name = "flowctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format (table or json).
    #[arg(long, global = true, default_value = "table")]
    format: String,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, env = "FLOWCTL_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format.
    #[arg(long, global = true, env = "FLOWCTL_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a lifecycle scenario and print its cycle summaries.
    Run(run::RunCommand),

    /// List the available scenarios.
    Scenarios,

    /// Show CLI version.
    Version,
}

impl Cli {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Run the CLI command.
    pub fn run(self) -> Result<()> {
        let format = OutputFormat::parse(&self.format);

        match self.command {
            Commands::Run(cmd) => cmd.run(format),
            Commands::Scenarios => scenarios::list(format),
            Commands::Version => {
                println!("flowctl {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
        }
    }
}
