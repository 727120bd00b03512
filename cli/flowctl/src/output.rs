//! Output formatting for CLI commands.

use colored::Colorize;
use eventflow_events::{CycleSummary, EventSummary};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::scenario::{Outcome, ScenarioReport};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }
}

/// One publish cycle, flattened for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CycleRow {
    #[tabled(rename = "Event ID")]
    pub event_id: String,

    #[tabled(rename = "Event")]
    pub event: String,

    #[tabled(rename = "Stage")]
    pub stage: String,

    #[tabled(rename = "Listeners")]
    pub listener_count: usize,

    #[tabled(rename = "Processed")]
    pub listeners: String,

    #[tabled(rename = "ms")]
    pub duration_ms: u64,
}

impl From<&CycleSummary> for CycleRow {
    fn from(summary: &CycleSummary) -> Self {
        Self {
            event_id: summary.event_id.to_string(),
            event: summary.event_name.clone(),
            stage: summary.stage.to_string(),
            listener_count: summary.listener_count(),
            listeners: summary.listeners.join(", "),
            duration_ms: u64::try_from(summary.duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// One completed event, flattened for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CompletedRow {
    #[tabled(rename = "Event ID")]
    pub event_id: String,

    #[tabled(rename = "Event")]
    pub event: String,

    #[tabled(rename = "Stages")]
    pub stages: String,

    #[tabled(rename = "Invocations")]
    pub listener_invocations: usize,

    #[tabled(rename = "Total ms")]
    pub total_ms: u64,
}

impl From<&EventSummary> for CompletedRow {
    fn from(summary: &EventSummary) -> Self {
        Self {
            event_id: summary.event_id.to_string(),
            event: summary.event_name.clone(),
            stages: summary
                .stages
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" > "),
            listener_invocations: summary.listener_invocations,
            total_ms: u64::try_from(summary.total.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Print data in the specified format.
pub fn print_output<T: Serialize + Tabled>(data: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No items found.".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => println!("{}", format_json(data, "[]")),
    }
}

/// Print a scenario report.
pub fn print_report(report: &ScenarioReport, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!(
                "{} {} ({})",
                "Scenario".bold(),
                report.scenario,
                report.run_id.to_string().dimmed()
            );

            let cycles: Vec<CycleRow> = report.cycles.iter().map(CycleRow::from).collect();
            print_output(&cycles, format);

            if !report.completed.is_empty() {
                println!("\n{}", "Completed events".bold());
                let completed: Vec<CompletedRow> =
                    report.completed.iter().map(CompletedRow::from).collect();
                print_output(&completed, format);
            }

            match report.outcome {
                Outcome::Succeeded => print_success("scenario completed"),
                Outcome::Failed => println!(
                    "{} {}",
                    "Failed:".red().bold(),
                    report.error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
        OutputFormat::Json => println!("{}", format_json(report, "{}")),
    }
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

fn format_json<T: Serialize + ?Sized>(data: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| fallback.to_string())
}
