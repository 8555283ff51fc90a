// SPDX-License-Identifier: PMPL-1.0-or-later

//! Raw-to-normalized value policy
//!
//! Every rule that turns an unexpected raw value into a safe default lives
//! here. Each function returns the normalized value plus the anomaly kind to
//! record, if any; the caller decides which host/plugin the anomaly belongs to.

use crate::types::{AnomalyKind, ComplianceStatus, Severity};

pub const MAX_CVSS: f64 = 10.0;

pub fn severity(raw: Option<&str>) -> (Severity, Option<AnomalyKind>) {
    let Some(raw) = raw else {
        return (Severity::Info, Some(AnomalyKind::MissingSeverity));
    };
    match raw.trim().parse::<i64>().ok().and_then(Severity::from_code) {
        Some(severity) => (severity, None),
        None => (Severity::Info, Some(AnomalyKind::UnrecognizedSeverity)),
    }
}

pub fn compliance_status(raw: Option<&str>) -> (ComplianceStatus, Option<AnomalyKind>) {
    let Some(raw) = raw else {
        return (
            ComplianceStatus::Unknown,
            Some(AnomalyKind::MissingComplianceStatus),
        );
    };
    match raw.trim().to_ascii_uppercase().as_str() {
        "PASSED" => (ComplianceStatus::Passed, None),
        "FAILED" => (ComplianceStatus::Failed, None),
        "WARNING" => (ComplianceStatus::Warning, None),
        "ERROR" => (ComplianceStatus::Error, None),
        _ => (
            ComplianceStatus::Unknown,
            Some(AnomalyKind::UnrecognizedComplianceStatus),
        ),
    }
}

/// Absent stays absent without complaint; a present value must be a finite
/// score within 0..=10.
pub fn cvss_score(raw: Option<&str>) -> (Option<f64>, Option<AnomalyKind>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    match raw.trim().parse::<f64>() {
        Ok(score) if score.is_finite() && (0.0..=MAX_CVSS).contains(&score) => (Some(score), None),
        _ => (None, Some(AnomalyKind::InvalidCvssScore)),
    }
}

pub fn port(raw: Option<&str>) -> (Option<u16>, Option<AnomalyKind>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    match raw.trim().parse::<u16>() {
        Ok(port) => (Some(port), None),
        Err(_) => (None, Some(AnomalyKind::InvalidPort)),
    }
}

/// Compliance items are recognised by family, by an explicit
/// `<compliance>true</compliance>` child, or by `cm:compliance-*` children.
pub fn is_compliance_item(
    plugin_family: Option<&str>,
    compliance_flag: Option<&str>,
    has_cm_children: bool,
    compliance_families: &[String],
) -> bool {
    let family_match = plugin_family
        .map(|family| {
            compliance_families
                .iter()
                .any(|known| known.eq_ignore_ascii_case(family.trim()))
        })
        .unwrap_or(false);
    let flagged = compliance_flag
        .map(|flag| flag.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    family_match || flagged || has_cm_children
}
