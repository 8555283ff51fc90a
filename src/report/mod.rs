// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report datasets, the renderer bundle and console output

pub mod assembler;
pub mod formatter;
pub mod output;

use crate::aggregate::AggregatedReport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use assembler::{assemble, Cell, ChartSeries, ReportDatasets, Sheet};
pub use formatter::ReportFormatter;
pub use output::ReportOutputFormat;

const REPORT_BUNDLE_SCHEMA: &str = "nessus-report.datasets";
const REPORT_BUNDLE_VERSION: u32 = 1;

/// Envelope written for the spreadsheet renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub schema: String,
    pub version: u32,
    pub tool: String,
    pub generated_at: String,
    pub datasets: ReportDatasets,
}

impl ReportBundle {
    pub fn new(datasets: ReportDatasets) -> Self {
        Self {
            schema: REPORT_BUNDLE_SCHEMA.to_string(),
            version: REPORT_BUNDLE_VERSION,
            tool: format!("nessus-report {}", env!("CARGO_PKG_VERSION")),
            generated_at: chrono::Utc::now().to_rfc3339(),
            datasets,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dataset bundle {}", path.display()))?;
        match ReportOutputFormat::from_path(path) {
            Some(ReportOutputFormat::Yaml) => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing yaml bundle {}", path.display())),
            _ => serde_json::from_str(&content)
                .with_context(|| format!("parsing json bundle {}", path.display())),
        }
    }
}

/// Print the console summary for one aggregated report
pub fn print_report(report: &AggregatedReport) {
    let formatter = ReportFormatter::new();
    formatter.print(report);
}
