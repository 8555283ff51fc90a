// SPDX-License-Identifier: PMPL-1.0-or-later

//! One complete load → build → aggregate → assemble run
//!
//! Either every stage succeeds and the caller gets a finished
//! [`ReportOutcome`], or an error is returned before any dataset exists.

use crate::aggregate::{self, AggregatedReport};
use crate::builder;
use crate::error::ReportError;
use crate::loader::{self, DocumentTree};
use crate::profile::ReportProfile;
use crate::report::{self, ReportDatasets};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report: AggregatedReport,
    pub datasets: ReportDatasets,
}

pub fn run(path: &Path, profile: &ReportProfile) -> Result<ReportOutcome, ReportError> {
    let tree = loader::load(path, profile.max_input_bytes)?;
    run_tree(&tree, profile)
}

/// Same as [`run`] for an in-memory document.
pub fn run_bytes(
    bytes: &[u8],
    label: &str,
    profile: &ReportProfile,
) -> Result<ReportOutcome, ReportError> {
    let tree = DocumentTree::from_bytes(bytes, label)?;
    run_tree(&tree, profile)
}

fn run_tree(tree: &DocumentTree, profile: &ReportProfile) -> Result<ReportOutcome, ReportError> {
    let model = builder::build(tree, &profile.build_options())?;
    let report = aggregate::aggregate(model, &profile.aggregate_options());
    let datasets = report::assemble(&report);
    info!(
        source = %report.source.label,
        hosts = report.summary.total_hosts,
        findings = report.summary.total_findings,
        compliance = report.summary.total_compliance,
        anomalies = report.summary.anomalies,
        "report assembled"
    );
    Ok(ReportOutcome { report, datasets })
}
