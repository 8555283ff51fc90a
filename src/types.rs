// SPDX-License-Identifier: PMPL-1.0-or-later

//! Core type definitions for nessus-report
//!
//! Normalized records produced by the builder pass. Every optional field of
//! the scan export is an `Option`, so "absent in the source" and "present but
//! empty" stay distinguishable all the way to the renderer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scan severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Maps the export's numeric severity code; `None` for anything outside 0..=4.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Severity::Info),
            1 => Some(Severity::Low),
            2 => Some(Severity::Medium),
            3 => Some(Severity::High),
            4 => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Color hint handed to the renderer for tabs and chart points.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Critical => "#D20F0F",
            Severity::High => "#FF8000",
            Severity::Medium => "#FFCC00",
            Severity::Low => "#00CC00",
            Severity::Info => "#0000FF",
        }
    }

    /// Report order: most severe first.
    pub fn descending() -> [Severity; 5] {
        [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
            Severity::Info,
        ]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceStatus {
    Passed,
    Failed,
    Warning,
    Error,
    Unknown,
}

impl ComplianceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceStatus::Passed => "PASSED",
            ComplianceStatus::Failed => "FAILED",
            ComplianceStatus::Warning => "WARNING",
            ComplianceStatus::Error => "ERROR",
            ComplianceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Host identity key. Records refer to their host through this key only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostKey(pub String);

impl HostKey {
    pub fn new(value: impl Into<String>) -> Self {
        HostKey(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// One scanned asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub identity: HostKey,
    pub ip: Option<String>,
    pub fqdn: Option<String>,
    pub netbios_name: Option<String>,
    pub operating_system: Option<String>,
    pub mac_address: Option<String>,
    pub scan_start: Option<String>,
    pub scan_end: Option<String>,
}

impl Host {
    pub fn new(identity: HostKey) -> Self {
        Self {
            identity,
            ip: None,
            fqdn: None,
            netbios_name: None,
            operating_system: None,
            mac_address: None,
            scan_start: None,
            scan_end: None,
        }
    }

    /// Fills properties this host lacks from a later block for the same identity.
    pub fn absorb(&mut self, other: Host) {
        fn fill(slot: &mut Option<String>, value: Option<String>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.ip, other.ip);
        fill(&mut self.fqdn, other.fqdn);
        fill(&mut self.netbios_name, other.netbios_name);
        fill(&mut self.operating_system, other.operating_system);
        fill(&mut self.mac_address, other.mac_address);
        fill(&mut self.scan_start, other.scan_start);
        fill(&mut self.scan_end, other.scan_end);
    }
}

/// One vulnerability detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub host: HostKey,
    pub plugin_id: String,
    pub plugin_name: String,
    pub plugin_family: Option<String>,
    pub severity: Severity,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub synopsis: Option<String>,
    pub description: Option<String>,
    pub solution: Option<String>,
    pub risk_factor: Option<String>,
    pub exploitability_ease: Option<String>,
    #[serde(default)]
    pub cves: Vec<String>,
    pub port: Option<u16>,
    pub protocol: Option<String>,
    pub service: Option<String>,
}

/// Outcome of one audit check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub host: HostKey,
    pub plugin_id: String,
    pub check_name: String,
    pub audit_file: Option<String>,
    pub status: ComplianceStatus,
    pub actual_value: Option<String>,
    pub expected_value: Option<String>,
    pub info: Option<String>,
    pub solution: Option<String>,
    pub see_also: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    MissingSeverity,
    UnrecognizedSeverity,
    MissingComplianceStatus,
    UnrecognizedComplianceStatus,
    InvalidCvssScore,
    InvalidPort,
    MissingHostIdentity,
}

/// A raw value that was normalized to a safe default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub kind: AnomalyKind,
    pub host: HostKey,
    pub plugin_id: Option<String>,
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub anomalies: Vec<Anomaly>,
}

impl Diagnostics {
    pub fn record(&mut self, anomaly: Anomaly) {
        tracing::warn!(
            kind = ?anomaly.kind,
            host = %anomaly.host,
            plugin_id = anomaly.plugin_id.as_deref().unwrap_or("-"),
            raw = anomaly.raw.as_deref().unwrap_or("<absent>"),
            "normalized unexpected value"
        );
        self.anomalies.push(anomaly);
    }

    pub fn count(&self) -> usize {
        self.anomalies.len()
    }

    pub fn count_of(&self, kind: AnomalyKind) -> usize {
        self.anomalies.iter().filter(|a| a.kind == kind).count()
    }
}

/// Where the scan document came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub label: String,
    pub bytes: u64,
    pub sha256: String,
}
