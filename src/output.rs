//! Console output.
//!
//! Styled end-of-run summary and user-facing error messages. Progress and
//! diagnostics go through `tracing` instead.

use crate::report::AggregatedReport;
use console::style;
use std::path::Path;
use tracing::info;

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Print the end-of-run summary to stdout.
pub fn print_summary(report: &AggregatedReport, path: &Path) {
    let summary = &report.summary;
    let mode = if summary.soft { "soft" } else { "full" };

    println!();
    println!("{}", style(RULE).cyan());
    println!("                  {} Scan Summary", style("scatterscan").cyan().bold());
    println!("{}", style(RULE).cyan());
    println!();
    println!("  {} {}", style("Mode:").bold(), mode);
    println!("  {} {}", style("Finished:").bold(), summary.timestamp);
    println!("  {} {}", style("Scan time:").bold(), summary.scan_time);
    println!(
        "  {} {} up of {} scanned",
        style("Hosts:").bold(),
        style(summary.up_hosts).green().bold(),
        summary.total_hosts
    );
    println!();

    for (target, entry) in &report.reports {
        println!(
            "  {} {}/{} up",
            style(target).bold(),
            entry.summary.up_hosts,
            entry.summary.total_hosts
        );
        for (ip, host) in &entry.hosts {
            let open: Vec<String> = host
                .open_ports()
                .map(|(protocol, port, info)| {
                    if info.name.is_empty() {
                        format!("{}/{}", port, protocol)
                    } else {
                        format!("{}/{} {}", port, protocol, info.name)
                    }
                })
                .collect();
            if open.is_empty() {
                println!("    {} {}", ip, style("no open ports").dim());
            } else {
                println!("    {} {}", ip, style(open.join(", ")).green());
            }
        }
    }

    println!();
    println!("  {} {}", style("Report:").bold(), path.display());
    println!();
}

/// Log the same figures as [`print_summary`].
pub fn log_summary(report: &AggregatedReport, path: &Path) {
    let summary = &report.summary;
    info!(
        total_hosts = summary.total_hosts,
        up_hosts = summary.up_hosts,
        scan_time = %summary.scan_time,
        soft = summary.soft,
        report = %path.display(),
        "scan complete"
    );
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}
