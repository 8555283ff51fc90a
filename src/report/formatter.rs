// SPDX-License-Identifier: PMPL-1.0-or-later

//! Console summary

use crate::aggregate::AggregatedReport;
use crate::types::{ComplianceStatus, Severity};
use colored::*;

pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn print(&self, report: &AggregatedReport) {
        println!("\n{}", "=== NESSUS REPORT SUMMARY ===".bold().cyan());
        println!("  Report: {}", report.report_name);
        println!("  Source: {}", report.source.label);
        println!("  SHA-256: {}", report.source.sha256.dimmed());
        println!();

        self.print_severity_summary(report);
        println!();

        self.print_top_hosts(report);
        println!();

        self.print_compliance_summary(report);

        if report.summary.anomalies > 0 {
            println!();
            println!(
                "  {} {} value(s) normalized to defaults (run with -v for details)",
                "Anomalies:".yellow().bold(),
                report.summary.anomalies
            );
        }
        println!();
    }

    fn print_severity_summary(&self, report: &AggregatedReport) {
        println!("{}", "FINDINGS".bold().yellow());
        println!(
            "  Hosts: {}  |  Findings: {}",
            report.summary.total_hosts, report.summary.total_findings
        );
        for severity in Severity::descending() {
            let count = report.summary.severity.get(severity);
            let label = format!("{:<9}", severity.label());
            let label = match severity {
                Severity::Critical => label.red().bold(),
                Severity::High => label.red(),
                Severity::Medium => label.yellow(),
                Severity::Low => label.green(),
                Severity::Info => label.blue(),
            };
            println!("    {} {:>6}", label, count);
        }
    }

    fn print_top_hosts(&self, report: &AggregatedReport) {
        println!("{}", "TOP HOSTS".bold().yellow());
        if report.top_hosts.is_empty() || report.summary.total_findings == 0 {
            println!("  {}", "No findings reported".green());
            return;
        }
        for tally in &report.top_hosts {
            println!("    {:<40} {:>6}", tally.host, tally.findings);
        }
    }

    fn print_compliance_summary(&self, report: &AggregatedReport) {
        let counts = &report.summary.compliance;
        if report.summary.total_compliance == 0 {
            println!("{}", "No compliance checks in this scan".dimmed());
            return;
        }
        println!("{}", "COMPLIANCE".bold().yellow());
        println!(
            "    {} {}  {} {}  {} {}  {} {}  {} {}",
            ComplianceStatus::Passed.label().green(),
            counts.passed,
            ComplianceStatus::Failed.label().red(),
            counts.failed,
            ComplianceStatus::Warning.label().yellow(),
            counts.warning,
            ComplianceStatus::Error.label().magenta(),
            counts.error,
            ComplianceStatus::Unknown.label().dimmed(),
            counts.unknown,
        );
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}
