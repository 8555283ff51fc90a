// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report model builder
//!
//! Walks `<Report>/<ReportHost>/<ReportItem>` and produces the normalized
//! host, finding and compliance records. Only the absence of any host block
//! is fatal; everything else is normalized through [`policy`] and counted in
//! the returned [`Diagnostics`].

pub mod policy;

use crate::error::SchemaError;
use crate::loader::{DocumentTree, Element};
use crate::types::*;
use std::collections::HashMap;
use tracing::debug;

const HOST_TAG: &str = "ReportHost";
const ITEM_TAG: &str = "ReportItem";
const PROPERTIES_TAG: &str = "HostProperties";
const CM_PREFIX: &str = "cm:compliance-";

pub const DEFAULT_COMPLIANCE_FAMILY: &str = "Policy Compliance";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// `pluginFamily` values that mark an item as a compliance check.
    pub compliance_families: Vec<String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            compliance_families: vec![DEFAULT_COMPLIANCE_FAMILY.to_string()],
        }
    }
}

/// Normalized records for one scan document
#[derive(Debug, Clone)]
pub struct ScanModel {
    pub report_name: String,
    pub source: SourceInfo,
    pub hosts: Vec<Host>,
    pub findings: Vec<Finding>,
    pub compliance: Vec<ComplianceResult>,
    pub diagnostics: Diagnostics,
}

pub fn build(tree: &DocumentTree, options: &BuildOptions) -> Result<ScanModel, SchemaError> {
    let report = tree.report();
    let report_name = report.attr("name").unwrap_or("unnamed").to_string();

    let host_blocks: Vec<&Element> = report.children_named(HOST_TAG).collect();
    if host_blocks.is_empty() {
        return Err(SchemaError::NoHosts {
            report: report_name,
        });
    }

    let mut model = ScanModel {
        report_name,
        source: tree.source.clone(),
        hosts: Vec::new(),
        findings: Vec::new(),
        compliance: Vec::new(),
        diagnostics: Diagnostics::default(),
    };
    let mut host_slots: HashMap<HostKey, usize> = HashMap::new();

    for (index, block) in host_blocks.iter().enumerate() {
        let host = read_host(block, index, &mut model.diagnostics);
        let key = host.identity.clone();

        match host_slots.get(&key) {
            Some(&slot) => {
                debug!(host = %key, "merging duplicate host block");
                model.hosts[slot].absorb(host);
            }
            None => {
                host_slots.insert(key.clone(), model.hosts.len());
                model.hosts.push(host);
            }
        }

        for item in block.children_named(ITEM_TAG) {
            if is_compliance(item, options) {
                let result = read_compliance(item, &key, &mut model.diagnostics);
                model.compliance.push(result);
            } else {
                let finding = read_finding(item, &key, &mut model.diagnostics);
                model.findings.push(finding);
            }
        }
    }

    debug!(
        hosts = model.hosts.len(),
        findings = model.findings.len(),
        compliance = model.compliance.len(),
        anomalies = model.diagnostics.count(),
        "built scan model"
    );
    Ok(model)
}

fn host_properties(block: &Element) -> HashMap<&str, &str> {
    block
        .child(PROPERTIES_TAG)
        .map(|props| {
            props
                .children_named("tag")
                .filter_map(|tag| tag.attr("name").map(|name| (name, tag.text.as_str())))
                .collect()
        })
        .unwrap_or_default()
}

fn read_host(block: &Element, index: usize, diagnostics: &mut Diagnostics) -> Host {
    let props = host_properties(block);
    let prop = |key: &str| props.get(key).map(|value| value.to_string());

    let non_empty = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let identity = non_empty(block.attr("name"))
        .or_else(|| non_empty(props.get("host-ip").copied()))
        .or_else(|| non_empty(props.get("host-fqdn").copied()));

    let identity = match identity {
        Some(identity) => HostKey::new(identity),
        None => {
            let key = HostKey::new(format!("host-{}", index + 1));
            diagnostics.record(Anomaly {
                kind: AnomalyKind::MissingHostIdentity,
                host: key.clone(),
                plugin_id: None,
                raw: None,
            });
            key
        }
    };

    Host {
        identity,
        ip: prop("host-ip"),
        fqdn: prop("host-fqdn").or_else(|| prop("hostname")),
        netbios_name: prop("netbios-name"),
        operating_system: prop("operating-system").or_else(|| prop("os")),
        mac_address: prop("mac-address"),
        scan_start: prop("HOST_START"),
        scan_end: prop("HOST_END"),
    }
}

fn is_compliance(item: &Element, options: &BuildOptions) -> bool {
    let has_cm_children = item
        .children
        .iter()
        .any(|child| child.name.starts_with(CM_PREFIX));
    policy::is_compliance_item(
        item.attr("pluginFamily"),
        item.child_text("compliance"),
        has_cm_children,
        &options.compliance_families,
    )
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn note(
    diagnostics: &mut Diagnostics,
    kind: Option<AnomalyKind>,
    host: &HostKey,
    plugin_id: &str,
    raw: Option<&str>,
) {
    if let Some(kind) = kind {
        diagnostics.record(Anomaly {
            kind,
            host: host.clone(),
            plugin_id: Some(plugin_id.to_string()),
            raw: owned(raw),
        });
    }
}

fn read_finding(item: &Element, host: &HostKey, diagnostics: &mut Diagnostics) -> Finding {
    let plugin_id = item.attr("pluginID").unwrap_or_default().to_string();

    let raw_severity = item.attr("severity");
    let (severity, anomaly) = policy::severity(raw_severity);
    note(diagnostics, anomaly, host, &plugin_id, raw_severity);

    // CVSS v3 wins when the export carries both.
    let (raw_cvss, cvss_vector) = match item.child_text("cvss3_base_score") {
        Some(score) => (Some(score), item.child_text("cvss3_vector")),
        None => (
            item.child_text("cvss_base_score"),
            item.child_text("cvss_vector"),
        ),
    };
    let (cvss_score, anomaly) = policy::cvss_score(raw_cvss);
    note(diagnostics, anomaly, host, &plugin_id, raw_cvss);

    let raw_port = item.attr("port");
    let (port, anomaly) = policy::port(raw_port);
    note(diagnostics, anomaly, host, &plugin_id, raw_port);

    let plugin_name = item
        .attr("pluginName")
        .or_else(|| item.child_text("plugin_name"))
        .unwrap_or_default()
        .to_string();

    Finding {
        host: host.clone(),
        plugin_name,
        plugin_family: owned(item.attr("pluginFamily")),
        severity,
        cvss_score,
        cvss_vector: owned(cvss_vector),
        synopsis: owned(item.child_text("synopsis")),
        description: owned(item.child_text("description")),
        solution: owned(item.child_text("solution")),
        risk_factor: owned(item.child_text("risk_factor")),
        exploitability_ease: owned(item.child_text("exploitability_ease")),
        cves: item
            .children_named("cve")
            .map(|cve| cve.text.trim().to_string())
            .filter(|cve| !cve.is_empty())
            .collect(),
        port,
        protocol: owned(item.attr("protocol")),
        service: owned(item.attr("svc_name")),
        plugin_id,
    }
}

fn read_compliance(
    item: &Element,
    host: &HostKey,
    diagnostics: &mut Diagnostics,
) -> ComplianceResult {
    let plugin_id = item.attr("pluginID").unwrap_or_default().to_string();
    let cm = |field: &str| item.child_text(&format!("{CM_PREFIX}{field}"));

    let raw_status = cm("result");
    let (status, anomaly) = policy::compliance_status(raw_status);
    note(diagnostics, anomaly, host, &plugin_id, raw_status);

    let check_name = cm("check-name")
        .or_else(|| item.attr("pluginName"))
        .unwrap_or_default()
        .to_string();

    ComplianceResult {
        host: host.clone(),
        check_name,
        audit_file: owned(cm("audit-file")),
        status,
        actual_value: owned(cm("actual-value")),
        expected_value: owned(cm("policy-value")),
        info: owned(cm("info")),
        solution: owned(cm("solution")),
        see_also: owned(cm("see-also")),
        plugin_id,
    }
}
