// SPDX-License-Identifier: PMPL-1.0-or-later

//! nessus-report: Nessus v2 export extraction and classification.
//!
//! Turns a `.nessus` scan export into the sheet-level datasets a
//! spreadsheet renderer consumes.
//!
//! PIPELINE:
//! 1. **Loader**: parses the XML into an owned element tree and locates
//!    the `<Report>` container.
//! 2. **Builder**: normalizes hosts, findings and compliance results,
//!    recording every defaulted value as a non-fatal anomaly.
//! 3. **Aggregate**: severity buckets, per-host index, dashboard counters.
//! 4. **Report**: the fixed sheet set plus chart series, and the bundle
//!    written for the renderer.

pub mod aggregate;
pub mod builder;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod storage;
pub mod sweep;
pub mod types;
