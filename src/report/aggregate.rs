//! Folding raw per-task results into the final report.
//!
//! Pure: no I/O and no errors. Results are grouped by (target, host) in one
//! pass, then each host's fragments are merged in a fixed order (protocol,
//! segment, then outcome), so the report does not depend on the order in
//! which tasks completed.

use super::{AggregatedReport, GlobalSummary, HostReport, TargetReport, TargetSummary};
use crate::scanner::RawScanResult;
use crate::types::{ResolvedTarget, Target};
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Build the report, stamped with the current local time.
pub fn aggregate(
    targets: &[ResolvedTarget],
    results: &[RawScanResult],
    soft: bool,
    elapsed: Duration,
) -> AggregatedReport {
    aggregate_at(targets, results, soft, elapsed, Local::now())
}

/// Build the report with an explicit completion time.
pub fn aggregate_at(
    targets: &[ResolvedTarget],
    results: &[RawScanResult],
    soft: bool,
    elapsed: Duration,
    completed_at: DateTime<Local>,
) -> AggregatedReport {
    let mut summary = GlobalSummary::new(soft, elapsed, completed_at);
    let mut reports: BTreeMap<String, TargetReport> = BTreeMap::new();
    let mut groups = group_results(results);
    let mut matched = 0;

    for resolved in targets {
        // Duplicate targets share one entry; the first occurrence wins.
        if reports.contains_key(resolved.target.as_str()) {
            continue;
        }

        let mut hosts = BTreeMap::new();
        for host in &resolved.hosts {
            let Some(mut fragments) = groups.remove(&(&resolved.target, host.ip)) else {
                continue;
            };
            matched += fragments.len();

            if !fragments.iter().any(|r| r.outcome.host_up) {
                continue;
            }

            fragments.sort_by(|a, b| {
                (a.task.merge_key(), a.task.ports, &a.outcome)
                    .cmp(&(b.task.merge_key(), b.task.ports, &b.outcome))
            });

            let mut record = HostReport::new(resolved.version);
            for fragment in fragments {
                record.merge(fragment);
            }
            hosts.insert(host.ip, record);
        }

        let target_summary = TargetSummary {
            total_hosts: resolved.hosts.len(),
            up_hosts: hosts.len(),
        };
        summary.total_hosts += target_summary.total_hosts;
        summary.up_hosts += target_summary.up_hosts;

        reports.insert(
            resolved.target.to_string(),
            TargetReport {
                summary: target_summary,
                hosts,
            },
        );
    }

    let ignored = results.len().saturating_sub(matched);
    if ignored > 0 {
        debug!(ignored, "results for unknown target/host pairs ignored");
    }

    AggregatedReport { summary, reports }
}

/// Index results by the (target, host) pair they belong to.
fn group_results(results: &[RawScanResult]) -> HashMap<(&Target, IpAddr), Vec<&RawScanResult>> {
    let mut groups: HashMap<(&Target, IpAddr), Vec<&RawScanResult>> = HashMap::new();
    for result in results {
        groups
            .entry((&result.task.target, result.task.host.ip))
            .or_default()
            .push(result);
    }
    groups
}
