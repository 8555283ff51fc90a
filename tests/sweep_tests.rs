// SPDX-License-Identifier: PMPL-1.0-or-later

//! Tests for sweep (batch mode), output writing and profile loading

use chrono::TimeZone;
use nessus_report::profile::ReportProfile;
use nessus_report::report::{ReportBundle, ReportOutputFormat};
use nessus_report::sweep::{self, SweepConfig};
use nessus_report::{pipeline, storage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SMALL_SCAN: &str = r#"<NessusClientData_v2><Report name="small">
  <ReportHost name="10.9.9.9">
    <ReportItem port="22" protocol="tcp" severity="4" pluginID="1" pluginName="Bad">
      <cvss_base_score>10.0</cvss_base_score>
    </ReportItem>
  </ReportHost>
</Report></NessusClientData_v2>"#;

fn fixture_bytes() -> Vec<u8> {
    fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.nessus")).unwrap()
}

fn config(dir: &Path, output_dir: Option<&Path>) -> SweepConfig {
    SweepConfig {
        directory: dir.to_path_buf(),
        output_dir: output_dir.map(Path::to_path_buf),
        format: ReportOutputFormat::Json,
        profile: ReportProfile::default(),
    }
}

#[test]
fn test_sweep_empty_directory() {
    let dir = TempDir::new().unwrap();
    let report = sweep::run(&config(dir.path(), None)).expect("sweep should succeed on empty dir");
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.files_failed, 0);
    assert!(report.results.is_empty());
}

#[test]
fn test_sweep_not_a_directory() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("scan.nessus");
    fs::write(&file, SMALL_SCAN).unwrap();
    assert!(sweep::run(&config(&file, None)).is_err());
}

#[test]
fn test_sweep_processes_exports_and_isolates_failures() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("q1")).unwrap();
    fs::write(dir.path().join("a.nessus"), fixture_bytes()).unwrap();
    fs::write(dir.path().join("q1/b.nessus"), SMALL_SCAN).unwrap();
    fs::write(dir.path().join("c.nessus"), "<NessusClientData_v2><Report>").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let out = TempDir::new().unwrap();
    let report = sweep::run(&config(dir.path(), Some(out.path()))).expect("sweep should succeed");

    assert_eq!(report.files_processed, 3, "only .nessus files are picked up");
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.total_findings, 8);
    assert_eq!(report.total_critical, 2);

    let names: Vec<String> = report
        .results
        .iter()
        .map(|r| r.input.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.nessus", "c.nessus", "b.nessus"]);

    let broken = &report.results[1];
    assert!(broken.error.is_some());
    assert!(broken.output.is_none());

    assert!(out.path().join("a.json").is_file());
    assert!(out.path().join("q1/b.json").is_file());
    assert!(!out.path().join("c.json").exists());
}

#[test]
fn test_sweep_keeps_equal_stems_in_different_subdirectories() {
    let dir = TempDir::new().unwrap();
    for sub in ["q1", "q2"] {
        fs::create_dir_all(dir.path().join(sub)).unwrap();
    }
    fs::write(dir.path().join("q1/scan.nessus"), fixture_bytes()).unwrap();
    fs::write(dir.path().join("q2/scan.nessus"), SMALL_SCAN).unwrap();

    let out = TempDir::new().unwrap();
    let report = sweep::run(&config(dir.path(), Some(out.path()))).expect("sweep should succeed");
    assert_eq!(report.files_failed, 0);

    let outputs: Vec<PathBuf> = report
        .results
        .iter()
        .map(|r| r.output.clone().expect("every export is written"))
        .collect();
    assert_eq!(
        outputs,
        vec![out.path().join("q1/scan.json"), out.path().join("q2/scan.json")]
    );

    let first = ReportBundle::load(&outputs[0]).expect("first bundle loads");
    let second = ReportBundle::load(&outputs[1]).expect("second bundle loads");
    assert_eq!(first.datasets.sheet("Critical").unwrap().rows.len(), 1);
    assert_eq!(first.datasets.sheet("High").unwrap().rows.len(), 1);
    assert_eq!(second.datasets.sheet("High").unwrap().rows.len(), 0);
    assert_ne!(first.datasets, second.datasets);
}

#[test]
fn test_failed_write_leaves_no_partial_file() {
    let dir = TempDir::new().unwrap();
    let outcome = pipeline::run_bytes(SMALL_SCAN.as_bytes(), "small", &ReportProfile::default())
        .expect("pipeline should succeed");
    let bundle = ReportBundle::new(outcome.datasets);

    // A non-empty directory in the way makes the final rename fail.
    let path = dir.path().join("report.json");
    fs::create_dir_all(path.join("occupied")).unwrap();

    assert!(storage::write_bundle(&bundle, &path, ReportOutputFormat::Json).is_err());
    assert!(!dir.path().join("report.json.partial").exists());
    assert!(path.join("occupied").is_dir());
}

#[test]
fn test_write_bundle_round_trips_through_loader() {
    let dir = TempDir::new().unwrap();
    let outcome = pipeline::run_bytes(SMALL_SCAN.as_bytes(), "small", &ReportProfile::default())
        .expect("pipeline should succeed");
    let bundle = ReportBundle::new(outcome.datasets);

    let path = dir.path().join("nested/report.yaml");
    storage::write_bundle(&bundle, &path, ReportOutputFormat::Yaml).expect("write should work");
    assert!(!dir.path().join("nested/report.yaml.partial").exists());

    let loaded = ReportBundle::load(&path).expect("bundle should load");
    assert_eq!(loaded.schema, "nessus-report.datasets");
    assert_eq!(loaded.datasets.sheet("Critical").unwrap().rows.len(), 1);
}

#[test]
fn test_default_output_name() {
    let now = chrono::Local
        .with_ymd_and_hms(2024, 3, 12, 9, 5, 7)
        .single()
        .unwrap();
    let name = storage::default_output_name(ReportOutputFormat::Json, now);
    assert_eq!(name.to_str(), Some("nessus_report_20240312090507.json"));
}

#[test]
fn test_profile_loading() {
    let dir = TempDir::new().unwrap();

    let yaml = dir.path().join("profile.yaml");
    fs::write(&yaml, "top_n: 3\ncompliance_families:\n  - Policy Compliance\n  - Custom Audits\n")
        .unwrap();
    let profile = ReportProfile::load(&yaml).expect("yaml profile should load");
    assert_eq!(profile.top_n, 3);
    assert_eq!(profile.compliance_families.len(), 2);
    assert_eq!(
        profile.max_input_bytes,
        ReportProfile::default().max_input_bytes
    );

    let json = dir.path().join("profile.json");
    fs::write(&json, r#"{"max_input_bytes": 2048}"#).unwrap();
    let profile = ReportProfile::load(&json).expect("json profile should load");
    assert_eq!(profile.max_input_bytes, 2048);
    assert_eq!(profile.top_n, 10);

    let toml = dir.path().join("profile.toml");
    fs::write(&toml, "top_n = 3").unwrap();
    assert!(ReportProfile::load(&toml).is_err());
}

#[test]
fn test_output_format_parse() {
    assert_eq!(ReportOutputFormat::parse("YML"), Some(ReportOutputFormat::Yaml));
    assert_eq!(ReportOutputFormat::parse("json"), Some(ReportOutputFormat::Json));
    assert_eq!(ReportOutputFormat::parse("xlsx"), None);

    assert_eq!(
        ReportOutputFormat::from_path(Path::new("out/report.YAML")),
        Some(ReportOutputFormat::Yaml)
    );
    assert_eq!(
        ReportOutputFormat::from_path(Path::new("report.json")),
        Some(ReportOutputFormat::Json)
    );
    assert_eq!(ReportOutputFormat::from_path(Path::new("report")), None);
}

#[test]
fn test_bundle_with_yml_extension_loads_as_yaml() {
    let dir = TempDir::new().unwrap();
    let outcome = pipeline::run_bytes(SMALL_SCAN.as_bytes(), "small", &ReportProfile::default())
        .expect("pipeline should succeed");
    let bundle = ReportBundle::new(outcome.datasets);

    let path = dir.path().join("report.yml");
    storage::write_bundle(&bundle, &path, ReportOutputFormat::Yaml).expect("write should work");
    let loaded = ReportBundle::load(&path).expect("yml should load as yaml");
    assert_eq!(loaded.generated_at, bundle.generated_at);
    assert_eq!(loaded.datasets.sheet("Critical").unwrap().rows.len(), 1);
}
