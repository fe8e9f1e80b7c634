//! Scan command implementation.
//!
//! Drives one run end to end: resolve, partition, dispatch, aggregate,
//! persist.

use super::{is_root, Cli};
use crate::config::AppSettings;
use crate::dispatch::Dispatcher;
use crate::error::CliResult;
use crate::output;
use crate::partition::partition;
use crate::report::{aggregate, AggregatedReport, ReportFormat, ReportWriter};
use crate::resolver::{HostLookup, Resolver};
use crate::scanner::{NmapScanner, Scanner};
use crate::types::{ScanMode, Target};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// A finished run: the report and where it was written.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub report: AggregatedReport,
    pub path: PathBuf,
}

/// Execute the command line against real DNS and nmap.
pub async fn execute(cli: &Cli, settings: &AppSettings) -> CliResult<ScanRun> {
    let targets = cli.load_targets()?;
    let mode = ScanMode::from_soft_flag(cli.soft);

    let scanner = NmapScanner::new(&settings.nmap_binary_path).with_sudo(settings.use_sudo);
    if !scanner.requires_privileges() && !is_root() {
        output::print_warning("running nmap without root privileges; MAC addresses will be missing.");
    }

    let run = run_scan(
        &Resolver::new().with_max_hosts(settings.max_hosts_per_target),
        Arc::new(scanner),
        &targets,
        mode,
        settings,
        cli.format,
    )
    .await?;

    output::log_summary(&run.report, &run.path);
    if !cli.quiet {
        output::print_summary(&run.report, &run.path);
    }
    Ok(run)
}

/// Run the whole pipeline with the given resolver and scanner.
///
/// Fails only on resolution, or when the report cannot be written; failed
/// scan tasks are dropped and the report is built from what remains.
pub async fn run_scan<L: HostLookup>(
    resolver: &Resolver<L>,
    scanner: Arc<dyn Scanner>,
    targets: &[Target],
    mode: ScanMode,
    settings: &AppSettings,
    format: ReportFormat,
) -> CliResult<ScanRun> {
    info!(targets = targets.len(), %mode, "resolving targets");
    let resolved = resolver.resolve_all(targets).await?;

    let tasks = partition(&resolved, mode, &settings.partition_config());
    info!(tasks = tasks.len(), "scan tasks generated");

    let mut dispatcher = Dispatcher::new(scanner)
        .with_progress_interval(settings.progress_interval())
        .with_task_timeout(settings.task_timeout());
    if let Some(workers) = settings.workers {
        dispatcher = dispatcher.with_workers(workers);
    }

    let outcome = dispatcher.dispatch(tasks).await;

    let report = aggregate(&resolved, &outcome.results, mode.is_soft(), outcome.elapsed);
    let path = ReportWriter::new(&settings.output_directory).write(&report, format)?;

    Ok(ScanRun { report, path })
}
