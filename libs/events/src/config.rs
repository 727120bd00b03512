//! Publisher configuration.

use anyhow::{Context, Result};

/// Publisher configuration (env-driven).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherConfig {
    /// How many cycle and event summaries the tracker keeps (0 disables history).
    pub summary_history: usize,

    /// Emit an info-level summary for every publish cycle.
    pub log_cycles: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            summary_history: 256,
            log_cycles: true,
        }
    }
}

impl PublisherConfig {
    /// Load configuration from environment variables.
    ///
    /// - `EVENTFLOW_SUMMARY_HISTORY`: summaries to keep (default 256)
    /// - `EVENTFLOW_LOG_CYCLES`: `true`/`false` (default `true`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let summary_history = lookup("EVENTFLOW_SUMMARY_HISTORY")
            .map(|v| v.trim().parse::<usize>())
            .transpose()
            .context("EVENTFLOW_SUMMARY_HISTORY must be a non-negative integer.")?
            .unwrap_or(defaults.summary_history);

        let log_cycles = lookup("EVENTFLOW_LOG_CYCLES")
            .map(|v| parse_bool(&v))
            .transpose()
            .context("EVENTFLOW_LOG_CYCLES must be true or false.")?
            .unwrap_or(defaults.log_cycles);

        Ok(Self {
            summary_history,
            log_cycles,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean: {other}"),
    }
}
