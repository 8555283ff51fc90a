// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sweep: batch reporting across a directory of scan exports
//!
//! Walks a directory for `.nessus` files and runs one independent pipeline
//! per file on the rayon pool. A failing file is recorded and does not stop
//! the others.

use crate::pipeline;
use crate::profile::ReportProfile;
use crate::report::{ReportBundle, ReportOutputFormat};
use crate::storage;
use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

const NESSUS_EXTENSION: &str = "nessus";

/// Configuration for a sweep run
pub struct SweepConfig {
    /// Directory searched recursively for scan exports
    pub directory: PathBuf,
    /// Where bundles are written; nothing is written when unset
    pub output_dir: Option<PathBuf>,
    pub format: ReportOutputFormat,
    pub profile: ReportProfile,
}

/// Outcome for a single scan export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub input: PathBuf,
    pub hosts: usize,
    pub findings: usize,
    pub critical: usize,
    pub high: usize,
    pub compliance: usize,
    pub anomalies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Complete sweep report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub created_at: String,
    pub directory: PathBuf,
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_findings: usize,
    pub total_critical: usize,
    pub results: Vec<FileResult>,
}

/// Find all `.nessus` files under the given directory, sorted by path
fn discover_exports(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        anyhow::bail!("Not a directory: {}", directory.display());
    }

    let mut exports: Vec<PathBuf> = WalkDir::new(directory)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(NESSUS_EXTENSION))
                .unwrap_or(false)
        })
        .collect();

    exports.sort();
    Ok(exports)
}

/// Output path for each export, or `None` per export when nothing is written.
/// Paths are unique across the whole sweep; a later export whose mirrored
/// name is already taken gets a numbered name.
fn plan_outputs(exports: &[PathBuf], config: &SweepConfig) -> Vec<Option<PathBuf>> {
    let Some(dir) = &config.output_dir else {
        return vec![None; exports.len()];
    };

    let mut taken: HashSet<PathBuf> = HashSet::new();
    exports
        .iter()
        .map(|input| {
            let base = storage::sweep_output_name(dir, &config.directory, input, config.format);
            let mut candidate = base.clone();
            let mut number = 2;
            while !taken.insert(candidate.clone()) {
                candidate = storage::numbered_output_name(&base, number);
                number += 1;
            }
            if candidate != base {
                warn!(
                    input = %input.display(),
                    output = %candidate.display(),
                    "output name already used in this sweep, numbering it"
                );
            }
            Some(candidate)
        })
        .collect()
}

fn process(input: &Path, output: Option<&Path>, config: &SweepConfig) -> FileResult {
    let mut result = FileResult {
        input: input.to_path_buf(),
        hosts: 0,
        findings: 0,
        critical: 0,
        high: 0,
        compliance: 0,
        anomalies: 0,
        output: None,
        error: None,
    };

    let outcome = match pipeline::run(input, &config.profile) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(input = %input.display(), error = %err, "sweep input failed");
            result.error = Some(err.to_string());
            return result;
        }
    };

    let summary = &outcome.report.summary;
    result.hosts = summary.total_hosts;
    result.findings = summary.total_findings;
    result.critical = summary.severity.critical;
    result.high = summary.severity.high;
    result.compliance = summary.total_compliance;
    result.anomalies = summary.anomalies;

    if let Some(path) = output {
        let bundle = ReportBundle::new(outcome.datasets);
        match storage::write_bundle(&bundle, path, config.format) {
            Ok(()) => result.output = Some(path.to_path_buf()),
            Err(err) => result.error = Some(format!("{:#}", err)),
        }
    }
    result
}

/// Run the pipeline for every export in a directory
pub fn run(config: &SweepConfig) -> Result<SweepReport> {
    let exports = discover_exports(&config.directory)?;
    let outputs = plan_outputs(&exports, config);

    // par_iter keeps input order in the collected results.
    let results: Vec<FileResult> = exports
        .par_iter()
        .zip(outputs.par_iter())
        .map(|(input, output)| process(input, output.as_deref(), config))
        .collect();

    let files_failed = results.iter().filter(|r| r.error.is_some()).count();
    let total_findings = results.iter().map(|r| r.findings).sum();
    let total_critical = results.iter().map(|r| r.critical).sum();

    Ok(SweepReport {
        created_at: chrono::Utc::now().to_rfc3339(),
        directory: config.directory.clone(),
        files_processed: exports.len(),
        files_failed,
        total_findings,
        total_critical,
        results,
    })
}

/// Print a summary table to the terminal
pub fn print_summary(report: &SweepReport, quiet: bool) {
    if quiet {
        return;
    }

    println!("\n=== SWEEP SUMMARY ===");
    println!(
        "Directory: {}  |  Files: {}  |  Failed: {}",
        report.directory.display(),
        report.files_processed,
        report.files_failed
    );
    println!(
        "Total findings: {}  |  Critical: {}",
        report.total_findings, report.total_critical
    );
    println!();

    if report.results.is_empty() {
        println!("  No .nessus files found.");
        return;
    }

    println!(
        "  {:<40} {:>6} {:>8} {:>6} {:>6} {:>8}",
        "Export", "Hosts", "Findings", "Crit", "High", "Checks"
    );
    println!("  {}", "-".repeat(80));

    for result in &report.results {
        let name = result
            .input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| result.input.display().to_string());
        if let Some(err) = &result.error {
            println!("  {:<40} ERROR: {}", name, err);
        } else {
            println!(
                "  {:<40} {:>6} {:>8} {:>6} {:>6} {:>8}",
                name,
                result.hosts,
                result.findings,
                result.critical,
                result.high,
                result.compliance,
            );
        }
    }
    println!();
}

/// Write sweep report as JSON
pub fn write_report(report: &SweepReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}
