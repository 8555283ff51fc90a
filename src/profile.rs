// SPDX-License-Identifier: PMPL-1.0-or-later

//! Report profile loading for pipeline tuning.

use crate::aggregate::{AggregateOptions, DEFAULT_TOP_N};
use crate::builder::{BuildOptions, DEFAULT_COMPLIANCE_FAMILY};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json;
use serde_yaml;
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_INPUT_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportProfile {
    /// Length of the top hosts / top plugins lists.
    pub top_n: usize,
    pub compliance_families: Vec<String>,
    pub max_input_bytes: u64,
}

impl Default for ReportProfile {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            compliance_families: vec![DEFAULT_COMPLIANCE_FAMILY.to_string()],
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

impl ReportProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading report profile {}", path.display()))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("parsing json report profile {}", path.display())),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("parsing yaml report profile {}", path.display())),
            _ => Err(anyhow!(
                "unsupported report profile extension for {}",
                path.display()
            )),
        }
    }

    /// Loads the given profile, or the defaults when none was passed.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        path.map(Self::load).unwrap_or_else(|| Ok(Self::default()))
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            compliance_families: self.compliance_families.clone(),
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions { top_n: self.top_n }
    }
}
