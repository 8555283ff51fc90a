// SPDX-License-Identifier: PMPL-1.0-or-later

//! Output naming and writing for dataset bundles

use crate::report::{ReportBundle, ReportOutputFormat};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_PREFIX: &str = "nessus_report";

/// `nessus_report_YYYYMMDDHHMMSS.<ext>`
pub fn default_output_name(format: ReportOutputFormat, now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "{}_{}.{}",
        DEFAULT_PREFIX,
        now.format("%Y%m%d%H%M%S"),
        format.extension()
    ))
}

/// Name for one input inside a sweep output directory. The input's
/// directory relative to `root` is mirrored under `dir`, so equal file
/// stems in different subdirectories never share an output.
pub fn sweep_output_name(
    dir: &Path,
    root: &Path,
    input: &Path,
    format: ReportOutputFormat,
) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    let mut path = input
        .strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(|relative| dir.join(relative))
        .unwrap_or_else(|| dir.to_path_buf());
    path.push(format!("{}.{}", stem, format.extension()));
    path
}

/// `report.json` -> `report-2.json`
pub fn numbered_output_name(path: &Path, number: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}-{}.{}", stem, number, ext.to_string_lossy()),
        None => format!("{}-{}", stem, number),
    };
    path.with_file_name(name)
}

/// Serialize fully, then write through a temporary sibling and rename, so a
/// reader never sees a half-written bundle.
pub fn write_bundle(bundle: &ReportBundle, path: &Path, format: ReportOutputFormat) -> Result<()> {
    let content = format.serialize(bundle)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let mut staging = path.as_os_str().to_owned();
    staging.push(".partial");
    let staging = PathBuf::from(staging);

    if let Err(err) = fs::write(&staging, content) {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| format!("writing {}", staging.display()));
    }
    if let Err(err) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(err).with_context(|| format!("moving {} into place", path.display()));
    }
    Ok(())
}
