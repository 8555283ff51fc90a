// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fatal error taxonomy. Per-record problems are not errors; see
//! [`crate::types::Diagnostics`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("unable to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is {size} bytes, above the {limit} byte input limit", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("malformed XML in {label} at byte {position}: {message}")]
    Malformed {
        label: String,
        position: u64,
        message: String,
    },

    #[error("{label} is not a Nessus v2 export: <{root}> has no <Report> element")]
    MissingReport { label: String, root: String },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("report {report} contains no host blocks")]
    NoHosts { report: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
