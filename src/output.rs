//! Output formatting and persistence for reports and chart data.
//!
//! Supports pretty JSON logging and writing report files, optionally
//! gzip-compressed.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::WasteReport;

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// File name of the report for `year`: `waste-report-<year>.json[.gz]`.
pub fn report_file_name(year: i32, gzip: bool) -> String {
    if gzip {
        format!("waste-report-{year}.json.gz")
    } else {
        format!("waste-report-{year}.json")
    }
}

/// Writes `report` as pretty JSON into `dir`, creating the directory if
/// needed. Returns the path written.
pub fn write_report(report: &WasteReport, dir: &Path, gzip: bool) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory '{}'", dir.display()))?;

    let path = dir.join(report_file_name(report.year, gzip));
    let json = serde_json::to_vec_pretty(report)?;

    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?
    } else {
        json
    };

    debug!(path = %path.display(), bytes = body.len(), gzip, "Writing report");
    fs::write(&path, body)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;

    info!(path = %path.display(), year = report.year, "Report written");
    Ok(path)
}
