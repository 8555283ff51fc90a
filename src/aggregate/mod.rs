// SPDX-License-Identifier: PMPL-1.0-or-later

//! Classifier/aggregator
//!
//! Turns a [`ScanModel`] into severity buckets, a per-host index and the
//! dashboard counters. All state lives in an [`AggregationContext`] created
//! for one call; nothing is shared between runs.

use crate::builder::ScanModel;
use crate::types::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub top_n: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }

    fn bump(&mut self, severity: Severity) {
        let slot = match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Info => &mut self.info,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComplianceCounts {
    pub passed: usize,
    pub failed: usize,
    pub warning: usize,
    pub error: usize,
    pub unknown: usize,
}

impl ComplianceCounts {
    pub fn get(&self, status: ComplianceStatus) -> usize {
        match status {
            ComplianceStatus::Passed => self.passed,
            ComplianceStatus::Failed => self.failed,
            ComplianceStatus::Warning => self.warning,
            ComplianceStatus::Error => self.error,
            ComplianceStatus::Unknown => self.unknown,
        }
    }

    fn bump(&mut self, status: ComplianceStatus) {
        let slot = match status {
            ComplianceStatus::Passed => &mut self.passed,
            ComplianceStatus::Failed => &mut self.failed,
            ComplianceStatus::Warning => &mut self.warning,
            ComplianceStatus::Error => &mut self.error,
            ComplianceStatus::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.warning + self.error + self.unknown
    }
}

/// A host with indexes into the report's finding and compliance lists
#[derive(Debug, Clone, Serialize)]
pub struct HostEntry {
    pub host: Host,
    pub findings: Vec<usize>,
    pub compliance: Vec<usize>,
    pub severity_counts: SeverityCounts,
    pub compliance_counts: ComplianceCounts,
}

impl HostEntry {
    fn new(host: Host) -> Self {
        Self {
            host,
            findings: Vec::new(),
            compliance: Vec::new(),
            severity_counts: SeverityCounts::default(),
            compliance_counts: ComplianceCounts::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostTally {
    pub host: HostKey,
    pub findings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginTally {
    pub plugin_id: String,
    pub plugin_name: String,
    pub severity: Severity,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_hosts: usize,
    pub total_findings: usize,
    pub severity: SeverityCounts,
    pub total_compliance: usize,
    pub compliance: ComplianceCounts,
    pub anomalies: usize,
}

/// Finding indexes per severity, each bucket in report order
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeverityBuckets {
    pub critical: Vec<usize>,
    pub high: Vec<usize>,
    pub medium: Vec<usize>,
    pub low: Vec<usize>,
    pub info: Vec<usize>,
}

impl SeverityBuckets {
    pub fn get(&self, severity: Severity) -> &[usize] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.high,
            Severity::Medium => &self.medium,
            Severity::Low => &self.low,
            Severity::Info => &self.info,
        }
    }

    fn get_mut(&mut self, severity: Severity) -> &mut Vec<usize> {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Medium => &mut self.medium,
            Severity::Low => &mut self.low,
            Severity::Info => &mut self.info,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedReport {
    pub report_name: String,
    pub source: SourceInfo,
    pub findings: Vec<Finding>,
    pub compliance: Vec<ComplianceResult>,
    pub hosts: Vec<HostEntry>,
    pub by_severity: SeverityBuckets,
    pub summary: Summary,
    pub top_hosts: Vec<HostTally>,
    pub top_plugins: Vec<PluginTally>,
    pub diagnostics: Diagnostics,
    #[serde(skip)]
    slots: HashMap<HostKey, usize>,
}

impl AggregatedReport {
    /// Findings of one severity, in report order.
    pub fn findings_with(&self, severity: Severity) -> impl Iterator<Item = &Finding> + '_ {
        self.by_severity
            .get(severity)
            .iter()
            .map(move |&index| &self.findings[index])
    }

    pub fn host(&self, key: &HostKey) -> Option<&HostEntry> {
        self.slots.get(key).map(|&slot| &self.hosts[slot])
    }
}

/// Per-run accumulator. Created by [`aggregate`] and consumed by it.
pub struct AggregationContext {
    hosts: Vec<HostEntry>,
    slots: HashMap<HostKey, usize>,
    buckets: SeverityBuckets,
    plugin_counts: HashMap<(String, String), (Severity, usize)>,
    summary: Summary,
}

impl AggregationContext {
    fn new(hosts: Vec<Host>) -> Self {
        let mut context = Self {
            hosts: Vec::with_capacity(hosts.len()),
            slots: HashMap::new(),
            buckets: SeverityBuckets::default(),
            plugin_counts: HashMap::new(),
            summary: Summary::default(),
        };
        for host in hosts {
            context.host_slot(host.identity.clone(), Some(host));
        }
        context
    }

    fn host_slot(&mut self, key: HostKey, host: Option<Host>) -> usize {
        if let Some(&slot) = self.slots.get(&key) {
            if let Some(host) = host {
                self.hosts[slot].host.absorb(host);
            }
            return slot;
        }
        let host = host.unwrap_or_else(|| {
            warn!(host = %key, "record references an unknown host, adding placeholder");
            Host::new(key.clone())
        });
        self.slots.insert(key, self.hosts.len());
        self.hosts.push(HostEntry::new(host));
        self.hosts.len() - 1
    }

    fn add_finding(&mut self, index: usize, finding: &Finding) {
        let slot = self.host_slot(finding.host.clone(), None);
        let entry = &mut self.hosts[slot];
        entry.findings.push(index);
        entry.severity_counts.bump(finding.severity);

        self.buckets.get_mut(finding.severity).push(index);
        self.summary.severity.bump(finding.severity);
        self.summary.total_findings += 1;

        let tally = self
            .plugin_counts
            .entry((finding.plugin_id.clone(), finding.plugin_name.clone()))
            .or_insert((finding.severity, 0));
        tally.0 = tally.0.max(finding.severity);
        tally.1 += 1;
    }

    fn add_compliance(&mut self, index: usize, result: &ComplianceResult) {
        let slot = self.host_slot(result.host.clone(), None);
        let entry = &mut self.hosts[slot];
        entry.compliance.push(index);
        entry.compliance_counts.bump(result.status);

        self.summary.compliance.bump(result.status);
        self.summary.total_compliance += 1;
    }

    fn finish(self, model: ScanModel, top_n: usize) -> AggregatedReport {
        let AggregationContext {
            hosts,
            slots,
            mut buckets,
            plugin_counts,
            mut summary,
        } = self;

        for severity in Severity::descending() {
            buckets
                .get_mut(severity)
                .sort_by(|&a, &b| finding_order(&model.findings, a, b));
        }

        summary.total_hosts = hosts.len();
        summary.anomalies = model.diagnostics.count();

        let mut top_hosts: Vec<HostTally> = hosts
            .iter()
            .map(|entry| HostTally {
                host: entry.host.identity.clone(),
                findings: entry.findings.len(),
            })
            .collect();
        top_hosts.sort_by(|a, b| b.findings.cmp(&a.findings).then_with(|| a.host.cmp(&b.host)));
        top_hosts.truncate(top_n);

        let mut top_plugins: Vec<PluginTally> = plugin_counts
            .into_iter()
            .map(|((plugin_id, plugin_name), (severity, occurrences))| PluginTally {
                plugin_id,
                plugin_name,
                severity,
                occurrences,
            })
            .collect();
        top_plugins.sort_by(|a, b| {
            b.occurrences
                .cmp(&a.occurrences)
                .then_with(|| a.plugin_id.cmp(&b.plugin_id))
                .then_with(|| a.plugin_name.cmp(&b.plugin_name))
        });
        top_plugins.truncate(top_n);

        AggregatedReport {
            report_name: model.report_name,
            source: model.source,
            findings: model.findings,
            compliance: model.compliance,
            hosts,
            by_severity: buckets,
            summary,
            top_hosts,
            top_plugins,
            diagnostics: model.diagnostics,
            slots,
        }
    }
}

/// Descending CVSS (scored before unscored), then plugin name, then
/// first-seen index.
fn finding_order(findings: &[Finding], a: usize, b: usize) -> Ordering {
    let (fa, fb) = (&findings[a], &findings[b]);
    let by_cvss = match (fa.cvss_score, fb.cvss_score) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_cvss
        .then_with(|| fa.plugin_name.cmp(&fb.plugin_name))
        .then_with(|| a.cmp(&b))
}

pub fn aggregate(mut model: ScanModel, options: &AggregateOptions) -> AggregatedReport {
    let mut context = AggregationContext::new(std::mem::take(&mut model.hosts));

    for (index, finding) in model.findings.iter().enumerate() {
        context.add_finding(index, finding);
    }
    for (index, result) in model.compliance.iter().enumerate() {
        context.add_compliance(index, result);
    }

    let report = context.finish(model, options.top_n);
    debug!(
        hosts = report.summary.total_hosts,
        findings = report.summary.total_findings,
        "aggregated report"
    );
    report
}
