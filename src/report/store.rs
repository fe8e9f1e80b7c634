//! Report persistence.
//!
//! Each run is written as a single file in the output directory, named after
//! the completion slug of the run.

use super::AggregatedReport;
use crate::error::{ReportError, ReportResult};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File format of a persisted report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Full nested report as pretty-printed JSON
    #[default]
    Json,
    /// One row per reported port
    Csv,
}

impl ReportFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

const CSV_HEADER: [&str; 11] = [
    "target", "host", "type", "mac", "protocol", "port", "state", "reason", "service", "product",
    "version",
];

/// Writes reports under one output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path a report would be written to.
    pub fn path_for(&self, report: &AggregatedReport, format: ReportFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", report.summary.filename, format.extension()))
    }

    /// Persist the report, creating the output directory if needed.
    ///
    /// Returns the path of the written file.
    pub fn write(&self, report: &AggregatedReport, format: ReportFormat) -> ReportResult<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Directory {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.path_for(report, format);
        let content = match format {
            ReportFormat::Json => serde_json::to_string_pretty(report)?.into_bytes(),
            ReportFormat::Csv => to_csv(report)?,
        };

        fs::write(&path, content).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), %format, "report written");
        Ok(path)
    }

    /// Read back a JSON report.
    pub fn load(path: &Path) -> ReportResult<AggregatedReport> {
        let content = fs::read_to_string(path).map_err(|source| ReportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Flatten the report into CSV rows, one per port.
fn to_csv(report: &AggregatedReport) -> ReportResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;

    for (target, entry) in &report.reports {
        for (ip, host) in &entry.hosts {
            let ip = ip.to_string();
            let kind = host.kind.to_string();
            let mac = host.mac.as_deref().unwrap_or("");

            for (protocol, ports) in &host.ports {
                let protocol = protocol.to_string();
                for (port, info) in ports {
                    wtr.write_record([
                        target.as_str(),
                        &ip,
                        &kind,
                        mac,
                        &protocol,
                        &port.to_string(),
                        &info.state,
                        &info.reason,
                        &info.name,
                        &info.product,
                        &info.version,
                    ])?;
                }
            }
        }
    }

    wtr.into_inner()
        .map_err(|e| ReportError::Csv(csv::Error::from(e.into_error())))
}
