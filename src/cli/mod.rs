//! Command-line interface.
//!
//! A single command: resolve the given targets, scan them with nmap and
//! write one aggregated report.
//!
//! - `scatterscan -t 192.0.2.1 example.org 198.51.100.0/28`
//! - `scatterscan -f targets.txt --soft -o csv`

mod scan;

pub use scan::{execute, run_scan, ScanRun};

use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::report::ReportFormat;
use crate::types::Target;
use clap::{ArgGroup, Parser};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// scatterscan - parallel nmap orchestration.
///
/// Expands targets into hosts, splits each host's port space into segments,
/// runs the segments concurrently and merges everything into one report.
#[derive(Parser, Debug)]
#[command(name = "scatterscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parallel nmap scanner with merged reports", long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["targets", "file"])))]
pub struct Cli {
    /// Targets to scan: addresses, CIDR blocks or hostnames
    #[arg(short, long, num_args = 1.., value_name = "TARGET")]
    pub targets: Vec<String>,

    /// File with one target per line
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Soft scan: TCP only, nmap default ports, no segmentation
    #[arg(short, long)]
    pub soft: bool,

    /// Report file format
    #[arg(short = 'o', long, value_enum, default_value_t = ReportFormat::Json)]
    pub format: ReportFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for report files
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path of the nmap executable
    #[arg(long, value_name = "PATH")]
    pub nmap_path: Option<PathBuf>,

    /// Number of concurrent nmap processes
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Run nmap without sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply_overrides(&self, settings: &mut AppSettings) {
        if let Some(dir) = &self.output_dir {
            settings.output_directory = dir.clone();
        }
        if let Some(path) = &self.nmap_path {
            settings.nmap_binary_path = path.clone();
        }
        if let Some(workers) = self.workers {
            settings.workers = Some(workers as usize);
        }
        if self.no_sudo {
            settings.use_sudo = false;
        }
        if let Some(path) = &self.log_file {
            settings.log_file = Some(path.clone());
        }
    }

    /// Collect the targets from the command line or the targets file.
    pub fn load_targets(&self) -> CliResult<Vec<Target>> {
        let targets = match &self.file {
            Some(path) => read_targets_file(path)?,
            None => dedup_targets(self.targets.iter().map(String::as_str)),
        };

        if targets.is_empty() {
            return Err(CliError::NoTargets);
        }
        Ok(targets)
    }
}

/// Read one target per line, skipping blank lines.
pub fn read_targets_file(path: &Path) -> CliResult<Vec<Target>> {
    let content = fs::read_to_string(path).map_err(|source| CliError::TargetsFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(dedup_targets(content.lines()))
}

/// Trim, drop blanks and keep the first occurrence of each target.
fn dedup_targets<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<Target> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(Target::new)
        .collect()
}

/// Check if running with root privileges.
pub fn is_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_targets() {
        let cli = Cli::try_parse_from(["scatterscan", "-t", "10.0.0.1", "example.org", "-s"]).unwrap();
        assert!(cli.soft);
        assert_eq!(cli.format, ReportFormat::Json);
        let targets = cli.load_targets().unwrap();
        assert_eq!(
            targets,
            vec![Target::new("10.0.0.1"), Target::new("example.org")]
        );
    }

    #[test]
    fn test_input_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["scatterscan"]).is_err());
        assert!(Cli::try_parse_from(["scatterscan", "-t", "10.0.0.1", "-f", "targets.txt"]).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(Cli::try_parse_from(["scatterscan", "-t", "10.0.0.1", "-w", "0"]).is_err());
    }

    #[test]
    fn test_targets_file_skips_blanks_and_duplicates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "192.0.2.1\n\n  example.org  \n192.0.2.1\n198.51.100.0/30\n").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["scatterscan", "-f", path.as_str(), "-o", "csv"]).unwrap();
        assert_eq!(cli.format, ReportFormat::Csv);

        let targets = cli.load_targets().unwrap();
        assert_eq!(
            targets,
            vec![
                Target::new("192.0.2.1"),
                Target::new("example.org"),
                Target::new("198.51.100.0/30"),
            ]
        );
    }

    #[test]
    fn test_empty_targets_file() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["scatterscan", "-f", path.as_str()]).unwrap();
        assert!(matches!(cli.load_targets(), Err(CliError::NoTargets)));
    }

    #[test]
    fn test_missing_targets_file() {
        let err = read_targets_file(Path::new("/nonexistent/targets.txt")).unwrap_err();
        assert!(matches!(err, CliError::TargetsFile { .. }));
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "scatterscan",
            "-t",
            "10.0.0.1",
            "--output-dir",
            "out",
            "--nmap-path",
            "/opt/nmap",
            "-w",
            "3",
            "--no-sudo",
        ])
        .unwrap();

        let mut settings = AppSettings::default();
        cli.apply_overrides(&mut settings);
        assert_eq!(settings.output_directory, PathBuf::from("out"));
        assert_eq!(settings.nmap_binary_path, PathBuf::from("/opt/nmap"));
        assert_eq!(settings.workers, Some(3));
        assert!(!settings.use_sudo);
        assert_eq!(settings.log_file, None);
    }
}
