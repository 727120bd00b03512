//! Scenarios command.

use anyhow::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{print_output, OutputFormat};
use crate::scenario::Scenario;

#[derive(Debug, Clone, Serialize, Tabled)]
struct ScenarioRow {
    #[tabled(rename = "Name")]
    name: &'static str,

    #[tabled(rename = "Description")]
    description: &'static str,
}

pub fn list(format: OutputFormat) -> Result<()> {
    let rows: Vec<ScenarioRow> = Scenario::ALL
        .iter()
        .map(|s| ScenarioRow {
            name: s.as_str(),
            description: s.description(),
        })
        .collect();
    print_output(&rows, format);
    Ok(())
}
