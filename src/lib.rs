//! # scatterscan - parallel nmap orchestration
//!
//! scatterscan turns a list of targets into many small nmap invocations,
//! runs them concurrently and merges their output into one report.
//!
//! ## Pipeline
//!
//! 1. [`resolver`] expands each target (address, CIDR block or hostname)
//!    into concrete hosts.
//! 2. [`partition`] splits every host into scan tasks, one per protocol and
//!    port segment (or a single default-ports TCP task in soft mode).
//! 3. [`dispatch`] runs the tasks on a bounded worker pool and reports
//!    progress on a timer.
//! 4. [`report`] folds the per-task fragments into an order-independent
//!    report and writes it to disk.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use scatterscan::dispatch::Dispatcher;
//! use scatterscan::partition::{partition, PartitionConfig};
//! use scatterscan::report::aggregate;
//! use scatterscan::resolver::Resolver;
//! use scatterscan::scanner::NmapScanner;
//! use scatterscan::types::{ScanMode, Target};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let targets = Resolver::new()
//!         .resolve_all(&[Target::new("192.0.2.0/30")])
//!         .await?;
//!     let tasks = partition(&targets, ScanMode::Soft, &PartitionConfig::default());
//!
//!     let scanner = Arc::new(NmapScanner::new("/usr/bin/nmap"));
//!     let outcome = Dispatcher::new(scanner).dispatch(tasks).await;
//!
//!     let report = aggregate(&targets, &outcome.results, true, outcome.elapsed);
//!     println!("{} of {} hosts up", report.summary.up_hosts, report.summary.total_hosts);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod output;
pub mod partition;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod types;

// Re-export commonly used types
pub use dispatch::{DispatchOutcome, Dispatcher, Progress};
pub use error::{CliError, ConfigError, ReportError, ScanError};
pub use report::{aggregate, AggregatedReport};
pub use resolver::Resolver;
pub use scanner::{NmapScanner, RawScanResult, ScanOutcome, Scanner};
pub use types::{ResolvedTarget, ScanMode, ScanTask, Target, TargetError};
