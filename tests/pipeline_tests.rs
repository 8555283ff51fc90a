// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end tests: load → build → aggregate → assemble

use nessus_report::error::{InputError, ReportError, SchemaError};
use nessus_report::pipeline::{self, ReportOutcome};
use nessus_report::profile::ReportProfile;
use nessus_report::report::assembler::{
    COMPLIANCE_SHEET, DASHBOARD_SHEET, HOST_SUMMARY_SHEET, SEVERITY_CHART, TOP_HOSTS_CHART,
};
use nessus_report::report::{Cell, Sheet};
use nessus_report::types::Severity;
use std::path::{Path, PathBuf};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.nessus")
}

fn run_fixture() -> ReportOutcome {
    pipeline::run(&fixture(), &ReportProfile::default()).expect("pipeline should succeed")
}

fn run_inline(xml: &str) -> Result<ReportOutcome, ReportError> {
    pipeline::run_bytes(xml.as_bytes(), "inline", &ReportProfile::default())
}

fn text(cell: &Cell) -> &str {
    match cell {
        Cell::Text(value) => value,
        other => panic!("expected text cell, got {other:?}"),
    }
}

fn integer(cell: &Cell) -> u64 {
    match cell {
        Cell::Integer(value) => *value,
        other => panic!("expected integer cell, got {other:?}"),
    }
}

fn column(sheet: &Sheet, name: &str) -> usize {
    sheet
        .column(name)
        .unwrap_or_else(|| panic!("{} has no column {}", sheet.name, name))
}

fn dashboard_value(outcome: &ReportOutcome, metric: &str) -> u64 {
    let sheet = outcome.datasets.sheet(DASHBOARD_SHEET).unwrap();
    let row = sheet
        .rows
        .iter()
        .find(|row| text(&row[0]) == metric)
        .unwrap_or_else(|| panic!("dashboard has no metric {metric}"));
    integer(&row[1])
}

#[test]
fn test_fixed_sheet_set() {
    let outcome = run_fixture();
    let names: Vec<&str> = outcome
        .datasets
        .sheets
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Dashboard",
            "Host Summary",
            "Critical",
            "High",
            "Medium",
            "Low",
            "Info",
            "Compliance"
        ]
    );
    assert_eq!(outcome.datasets.charts.len(), 2);
}

#[test]
fn test_no_finding_lost_or_duplicated() {
    let outcome = run_fixture();
    let rows: usize = Severity::descending()
        .iter()
        .map(|s| outcome.datasets.sheet(s.label()).unwrap().rows.len())
        .sum();
    assert_eq!(rows, outcome.report.findings.len());
    assert_eq!(rows, 7);
    assert_eq!(outcome.datasets.sheet("Low").unwrap().rows.len(), 0);
}

#[test]
fn test_host_summary_totals_add_up() {
    let outcome = run_fixture();
    let sheet = outcome.datasets.sheet(HOST_SUMMARY_SHEET).unwrap();
    let total_col = column(sheet, "Total");
    for row in &sheet.rows {
        let per_severity: u64 = Severity::descending()
            .iter()
            .map(|s| integer(&row[column(sheet, s.label())]))
            .sum();
        assert_eq!(per_severity, integer(&row[total_col]));
    }
}

#[test]
fn test_host_summary_rows() {
    let outcome = run_fixture();
    let sheet = outcome.datasets.sheet(HOST_SUMMARY_SHEET).unwrap();
    assert_eq!(sheet.rows.len(), 3);

    let hosts: Vec<&str> = sheet.rows.iter().map(|row| text(&row[0])).collect();
    assert_eq!(hosts, vec!["192.168.1.10", "192.168.1.20", "192.168.1.30"]);

    let win = &sheet.rows[0];
    assert_eq!(integer(&win[column(sheet, "Critical")]), 1);
    assert_eq!(integer(&win[column(sheet, "Medium")]), 1);
    assert_eq!(integer(&win[column(sheet, "Info")]), 1);
    assert_eq!(integer(&win[column(sheet, "Compliance Passed")]), 1);
    assert_eq!(integer(&win[column(sheet, "Compliance Failed")]), 1);

    // Scanned but clean: present with zeros, blank OS.
    let clean = &sheet.rows[2];
    assert_eq!(integer(&clean[column(sheet, "Total")]), 0);
    for severity in Severity::descending() {
        assert_eq!(integer(&clean[column(sheet, severity.label())]), 0);
    }
    assert_eq!(clean[column(sheet, "Operating System")], Cell::Blank);
}

#[test]
fn test_severity_sheet_ordering() {
    let outcome = run_fixture();
    let plugin_ids = |name: &str| -> Vec<String> {
        let sheet = outcome.datasets.sheet(name).unwrap();
        let col = column(sheet, "Plugin ID");
        sheet.rows.iter().map(|r| text(&r[col]).to_string()).collect()
    };
    assert_eq!(plugin_ids("Medium"), vec!["51192", "57608"]);
    assert_eq!(plugin_ids("Info"), vec!["11219", "19506", "10287"]);
}

#[test]
fn test_finding_row_cells() {
    let outcome = run_fixture();
    let sheet = outcome.datasets.sheet("Critical").unwrap();
    let row = &sheet.rows[0];
    assert_eq!(text(&row[column(sheet, "Host")]), "192.168.1.10");
    assert_eq!(text(&row[column(sheet, "FQDN")]), "win01.corp.local");
    assert_eq!(row[column(sheet, "Port")], Cell::Integer(445));
    assert_eq!(row[column(sheet, "CVSS Score")], Cell::Number(9.8));
    assert_eq!(sheet.tab_color.as_deref(), Some("#D20F0F"));

    let info = outcome.datasets.sheet("Info").unwrap();
    let traceroute = info
        .rows
        .iter()
        .find(|r| text(&r[column(info, "Plugin ID")]) == "10287")
        .unwrap();
    assert_eq!(traceroute[column(info, "CVSS Score")], Cell::Blank);
    assert_eq!(traceroute[column(info, "Solution")], Cell::Blank);
}

#[test]
fn test_repeated_runs_are_identical() {
    let first = run_fixture();
    let second = run_fixture();
    assert_eq!(first.datasets, second.datasets);

    let a = serde_json::to_string(&first.datasets).unwrap();
    let b = serde_json::to_string(&second.datasets).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_dashboard_counters() {
    let outcome = run_fixture();
    assert_eq!(dashboard_value(&outcome, "Total Hosts"), 3);
    assert_eq!(dashboard_value(&outcome, "Total Findings"), 7);
    assert_eq!(dashboard_value(&outcome, "Critical Findings"), 1);
    assert_eq!(dashboard_value(&outcome, "Info Findings"), 3);
    assert_eq!(dashboard_value(&outcome, "Total Compliance Checks"), 3);
    assert_eq!(dashboard_value(&outcome, "Compliance UNKNOWN"), 1);
    assert_eq!(dashboard_value(&outcome, "Anomalies"), 2);

    let top_hosts = outcome.datasets.chart(TOP_HOSTS_CHART).unwrap();
    let order: Vec<&str> = top_hosts.points.iter().map(|p| p.category.as_str()).collect();
    assert_eq!(order, vec!["192.168.1.20", "192.168.1.10", "192.168.1.30"]);
    assert_eq!(top_hosts.value_of("192.168.1.20"), Some(4));
}

#[test]
fn test_compliance_sheet() {
    let outcome = run_fixture();
    let sheet = outcome.datasets.sheet(COMPLIANCE_SHEET).unwrap();
    assert_eq!(sheet.rows.len(), 3);
    let status = column(sheet, "Status");
    let statuses: Vec<&str> = sheet.rows.iter().map(|r| text(&r[status])).collect();
    assert_eq!(statuses, vec!["PASSED", "FAILED", "UNKNOWN"]);
    assert_eq!(sheet.rows[2][column(sheet, "Actual Value")], Cell::Blank);

    let plugin_id = column(sheet, "Plugin ID");
    let ids: Vec<&str> = sheet.rows.iter().map(|r| text(&r[plugin_id])).collect();
    assert_eq!(ids, vec!["21156", "21156", "66756"]);

    let info = column(sheet, "Info");
    let see_also = column(sheet, "See Also");
    assert_eq!(
        text(&sheet.rows[0][info]),
        "Password history prevents reuse of old passwords."
    );
    assert_eq!(
        text(&sheet.rows[0][see_also]),
        "https://workbench.cisecurity.org/files/2765"
    );
    assert_eq!(sheet.rows[1][info], Cell::Blank);
    assert_eq!(sheet.rows[1][see_also], Cell::Blank);
}

const CRITICAL_AND_HIGH: &str = r#"<?xml version="1.0" ?>
<NessusClientData_v2><Report name="two">
  <ReportHost name="10.0.0.1">
    <ReportItem port="443" protocol="tcp" severity="4" pluginID="1001" pluginName="Critical thing">
      <cvss3_base_score>9.8</cvss3_base_score>
    </ReportItem>
    <ReportItem port="80" protocol="tcp" severity="3" pluginID="1002" pluginName="High thing">
      <cvss3_base_score>7.5</cvss3_base_score>
    </ReportItem>
  </ReportHost>
</Report></NessusClientData_v2>"#;

#[test]
fn test_critical_and_high_distribution() {
    let outcome = run_inline(CRITICAL_AND_HIGH).expect("should succeed");
    assert_eq!(outcome.datasets.sheet("Critical").unwrap().rows.len(), 1);
    assert_eq!(outcome.datasets.sheet("High").unwrap().rows.len(), 1);

    let chart = outcome.datasets.chart(SEVERITY_CHART).unwrap();
    let values: Vec<(&str, u64)> = chart
        .points
        .iter()
        .map(|p| (p.category.as_str(), p.value))
        .collect();
    assert_eq!(
        values,
        vec![
            ("Critical", 1),
            ("High", 1),
            ("Medium", 0),
            ("Low", 0),
            ("Info", 0)
        ]
    );
}

#[test]
fn test_out_of_range_severity_counts_once() {
    let outcome = run_inline(
        r#"<NessusClientData_v2><Report name="r"><ReportHost name="h">
            <ReportItem port="0" severity="5" pluginID="7" pluginName="odd"/>
        </ReportHost></Report></NessusClientData_v2>"#,
    )
    .expect("should succeed");
    assert_eq!(outcome.report.summary.anomalies, 1);
    assert_eq!(outcome.datasets.sheet("Info").unwrap().rows.len(), 1);
    assert_eq!(dashboard_value(&outcome, "Anomalies"), 1);
}

#[test]
fn test_unrecognized_compliance_status_is_unknown() {
    let outcome = run_inline(
        r#"<NessusClientData_v2><Report name="r"><ReportHost name="h">
            <ReportItem port="0" severity="1" pluginID="21156" pluginName="Windows Compliance Checks" pluginFamily="Policy Compliance">
              <cm:compliance-check-name>Audit me</cm:compliance-check-name>
              <cm:compliance-result>MAYBE</cm:compliance-result>
            </ReportItem>
        </ReportHost></Report></NessusClientData_v2>"#,
    )
    .expect("should succeed");
    let sheet = outcome.datasets.sheet(COMPLIANCE_SHEET).unwrap();
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(text(&sheet.rows[0][column(sheet, "Status")]), "UNKNOWN");
    assert_eq!(text(&sheet.rows[0][column(sheet, "Check Name")]), "Audit me");
}

#[test]
fn test_empty_report_is_schema_error() {
    let err = run_inline(r#"<NessusClientData_v2><Report name="r"/></NessusClientData_v2>"#)
        .unwrap_err();
    assert!(matches!(err, ReportError::Schema(SchemaError::NoHosts { .. })));
}

#[test]
fn test_missing_input_is_input_error() {
    let err = pipeline::run(Path::new("missing.nessus"), &ReportProfile::default()).unwrap_err();
    assert!(matches!(err, ReportError::Input(InputError::NotFound { .. })));
}

#[test]
fn test_zero_findings_is_valid() {
    let outcome = run_inline(
        r#"<NessusClientData_v2><Report name="r"><ReportHost name="quiet"/></Report></NessusClientData_v2>"#,
    )
    .expect("should succeed");
    assert_eq!(outcome.report.summary.total_findings, 0);
    assert_eq!(dashboard_value(&outcome, "Total Hosts"), 1);
    let chart = outcome.datasets.chart(SEVERITY_CHART).unwrap();
    assert!(chart.points.iter().all(|p| p.value == 0));
}

#[test]
fn test_profile_top_n() {
    let profile = ReportProfile {
        top_n: 1,
        ..ReportProfile::default()
    };
    let outcome = pipeline::run(&fixture(), &profile).unwrap();
    assert_eq!(outcome.report.top_hosts.len(), 1);
    assert_eq!(outcome.datasets.chart(TOP_HOSTS_CHART).unwrap().points.len(), 1);
}
