//! Error types for scatterscan.
//!
//! Uses `thiserror` for ergonomic error definitions. Only resolution,
//! configuration and report errors ever reach the top level; scan failures
//! are absorbed per task.

use crate::types::TargetError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single scan invocation.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to run scanner: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("scanner exited with {status} and no output: {stderr}")]
    EmptyOutput { status: String, stderr: String },

    #[error("unparsable scanner output: {0}")]
    Xml(#[from] quick_xml::DeError),
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors related to configuration management.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    InvalidValue(String),

    #[error("failed to open log file {path}: {reason}")]
    LogFile { path: PathBuf, reason: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while persisting a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to create output directory {path}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read report {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for report persistence.
pub type ReportResult<T> = Result<T, ReportError>;

/// Top-level error for a run.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to read targets file {path}: {source}")]
    TargetsFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no targets to scan")]
    NoTargets,
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
