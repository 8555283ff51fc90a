// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sheet dataset assembly
//!
//! Pure transformation of an [`AggregatedReport`] into the fixed sheet set
//! and chart series the renderer consumes. Row order always follows the
//! aggregator's order.

use crate::aggregate::AggregatedReport;
use crate::types::{ComplianceStatus, Finding, Severity};
use serde::{Deserialize, Serialize};

pub const DASHBOARD_SHEET: &str = "Dashboard";
pub const HOST_SUMMARY_SHEET: &str = "Host Summary";
pub const COMPLIANCE_SHEET: &str = "Compliance";
pub const SEVERITY_CHART: &str = "Severity Distribution";
pub const TOP_HOSTS_CHART: &str = "Top Hosts";

const FINDING_COLUMNS: [&str; 10] = [
    "Host",
    "FQDN",
    "Port",
    "Protocol",
    "Service",
    "Plugin ID",
    "Plugin Name",
    "CVSS Score",
    "Description",
    "Solution",
];

const HOST_COLUMNS: [&str; 12] = [
    "Host",
    "FQDN",
    "Operating System",
    "Critical",
    "High",
    "Medium",
    "Low",
    "Info",
    "Total",
    "Compliance Passed",
    "Compliance Failed",
    "Compliance Warning",
];

const COMPLIANCE_COLUMNS: [&str; 10] = [
    "Host",
    "Plugin ID",
    "Check Name",
    "Audit File",
    "Status",
    "Actual Value",
    "Expected Value",
    "Info",
    "Solution",
    "See Also",
];

/// A single cell; `Blank` marks data absent from the scan export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Blank,
    Integer(u64),
    Number(f64),
    Text(String),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn optional_text(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Blank)
    }

    fn count(value: usize) -> Self {
        Cell::Integer(value as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_color: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            tab_color: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub category: String,
    pub value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn value_of(&self, category: &str) -> Option<u64> {
        self.points
            .iter()
            .find(|point| point.category == category)
            .map(|point| point.value)
    }
}

/// Everything handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDatasets {
    pub sheets: Vec<Sheet>,
    pub charts: Vec<ChartSeries>,
}

impl ReportDatasets {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn chart(&self, name: &str) -> Option<&ChartSeries> {
        self.charts.iter().find(|chart| chart.name == name)
    }
}

pub fn assemble(report: &AggregatedReport) -> ReportDatasets {
    let mut sheets = vec![dashboard_sheet(report), host_summary_sheet(report)];
    sheets.extend(Severity::descending().map(|severity| severity_sheet(report, severity)));
    sheets.push(compliance_sheet(report));

    ReportDatasets {
        sheets,
        charts: vec![severity_chart(report), top_hosts_chart(report)],
    }
}

fn dashboard_sheet(report: &AggregatedReport) -> Sheet {
    let summary = &report.summary;
    let mut sheet = Sheet::new(DASHBOARD_SHEET, &["Metric", "Value"]);
    let mut push = |metric: String, value: Cell| {
        sheet.rows.push(vec![Cell::Text(metric), value]);
    };

    push("Report Name".into(), Cell::text(&report.report_name));
    push("Source File".into(), Cell::text(&report.source.label));
    push("Source SHA-256".into(), Cell::text(&report.source.sha256));
    push("Total Hosts".into(), Cell::count(summary.total_hosts));
    push("Total Findings".into(), Cell::count(summary.total_findings));
    for severity in Severity::descending() {
        push(
            format!("{} Findings", severity.label()),
            Cell::count(summary.severity.get(severity)),
        );
    }
    push(
        "Total Compliance Checks".into(),
        Cell::count(summary.total_compliance),
    );
    for status in [
        ComplianceStatus::Passed,
        ComplianceStatus::Failed,
        ComplianceStatus::Warning,
        ComplianceStatus::Error,
        ComplianceStatus::Unknown,
    ] {
        push(
            format!("Compliance {}", status.label()),
            Cell::count(summary.compliance.get(status)),
        );
    }
    push("Anomalies".into(), Cell::count(summary.anomalies));
    for plugin in &report.top_plugins {
        push(
            format!("Top Plugin: {} ({})", plugin.plugin_name, plugin.plugin_id),
            Cell::count(plugin.occurrences),
        );
    }
    sheet
}

fn host_summary_sheet(report: &AggregatedReport) -> Sheet {
    let mut sheet = Sheet::new(HOST_SUMMARY_SHEET, &HOST_COLUMNS);
    for entry in &report.hosts {
        let host = &entry.host;
        let mut row = vec![
            Cell::text(host.identity.as_str()),
            Cell::optional_text(host.fqdn.as_deref()),
            Cell::optional_text(host.operating_system.as_deref()),
        ];
        row.extend(
            Severity::descending().map(|severity| Cell::count(entry.severity_counts.get(severity))),
        );
        row.push(Cell::count(entry.severity_counts.total()));
        row.push(Cell::count(entry.compliance_counts.passed));
        row.push(Cell::count(entry.compliance_counts.failed));
        row.push(Cell::count(entry.compliance_counts.warning));
        sheet.rows.push(row);
    }
    sheet
}

fn severity_sheet(report: &AggregatedReport, severity: Severity) -> Sheet {
    let mut sheet = Sheet::new(severity.label(), &FINDING_COLUMNS);
    sheet.tab_color = Some(severity.color().to_string());
    sheet.rows = report
        .findings_with(severity)
        .map(|finding| finding_row(report, finding))
        .collect();
    sheet
}

fn finding_row(report: &AggregatedReport, finding: &Finding) -> Vec<Cell> {
    let fqdn = report
        .host(&finding.host)
        .and_then(|entry| entry.host.fqdn.as_deref());
    vec![
        Cell::text(finding.host.as_str()),
        Cell::optional_text(fqdn),
        finding
            .port
            .map(|port| Cell::Integer(u64::from(port)))
            .unwrap_or(Cell::Blank),
        Cell::optional_text(finding.protocol.as_deref()),
        Cell::optional_text(finding.service.as_deref()),
        Cell::text(&finding.plugin_id),
        Cell::text(&finding.plugin_name),
        finding.cvss_score.map(Cell::Number).unwrap_or(Cell::Blank),
        Cell::optional_text(finding.description.as_deref()),
        Cell::optional_text(finding.solution.as_deref()),
    ]
}

fn compliance_sheet(report: &AggregatedReport) -> Sheet {
    let mut sheet = Sheet::new(COMPLIANCE_SHEET, &COMPLIANCE_COLUMNS);
    sheet.tab_color = Some("#800080".to_string());
    for entry in &report.hosts {
        for &index in &entry.compliance {
            let result = &report.compliance[index];
            sheet.rows.push(vec![
                Cell::text(result.host.as_str()),
                Cell::text(&result.plugin_id),
                Cell::text(&result.check_name),
                Cell::optional_text(result.audit_file.as_deref()),
                Cell::text(result.status.label()),
                Cell::optional_text(result.actual_value.as_deref()),
                Cell::optional_text(result.expected_value.as_deref()),
                Cell::optional_text(result.info.as_deref()),
                Cell::optional_text(result.solution.as_deref()),
                Cell::optional_text(result.see_also.as_deref()),
            ]);
        }
    }
    sheet
}

fn severity_chart(report: &AggregatedReport) -> ChartSeries {
    ChartSeries {
        name: SEVERITY_CHART.to_string(),
        points: Severity::descending()
            .into_iter()
            .map(|severity| ChartPoint {
                category: severity.label().to_string(),
                value: report.summary.severity.get(severity) as u64,
                color: Some(severity.color().to_string()),
            })
            .collect(),
    }
}

fn top_hosts_chart(report: &AggregatedReport) -> ChartSeries {
    ChartSeries {
        name: TOP_HOSTS_CHART.to_string(),
        points: report
            .top_hosts
            .iter()
            .map(|tally| ChartPoint {
                category: tally.host.to_string(),
                value: tally.findings as u64,
                color: None,
            })
            .collect(),
    }
}
