//! Aggregated scan report.
//!
//! The report is keyed by the user's target strings; under each target it
//! holds a short summary and one record per host that answered. It is built
//! once by [`aggregate`] and never mutated afterwards.

mod aggregate;
mod store;

pub use aggregate::{aggregate, aggregate_at};
pub use store::{ReportFormat, ReportWriter};

use crate::dispatch::format_elapsed;
use crate::scanner::RawScanResult;
use crate::types::{IpVersion, PortInfo, Protocol};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

/// Format of the filesystem-safe report slug.
pub const FILENAME_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";
/// Format of the human-readable completion time.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Everything known about one responsive host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    /// IP version of the target this host came from.
    #[serde(rename = "type")]
    pub kind: IpVersion,
    pub mac: Option<String>,
    pub hostnames: Vec<String>,
    pub ports: BTreeMap<Protocol, BTreeMap<u16, PortInfo>>,
    /// Scanner errors and warnings, in merge order, duplicates kept.
    pub errors: Vec<String>,
}

impl HostReport {
    /// An empty record with a port map for every protocol.
    pub fn new(kind: IpVersion) -> Self {
        Self {
            kind,
            mac: None,
            hostnames: Vec::new(),
            ports: Protocol::ALL
                .iter()
                .map(|&protocol| (protocol, BTreeMap::new()))
                .collect(),
            errors: Vec::new(),
        }
    }

    /// Fold one scan fragment into this record.
    pub fn merge(&mut self, result: &RawScanResult) {
        let outcome = &result.outcome;

        self.errors.extend(outcome.errors.iter().cloned());
        self.errors.extend(outcome.warnings.iter().cloned());

        self.ports
            .entry(result.task.protocol)
            .or_default()
            .extend(outcome.ports.iter().map(|(port, info)| (*port, info.clone())));

        if self.mac.is_none() {
            self.mac = outcome.mac.clone();
        }

        for hostname in &outcome.hostnames {
            if !self.hostnames.contains(hostname) {
                self.hostnames.push(hostname.clone());
            }
        }
    }

    /// Ports in an open state, across protocols.
    pub fn open_ports(&self) -> impl Iterator<Item = (Protocol, u16, &PortInfo)> {
        self.ports.iter().flat_map(|(protocol, ports)| {
            ports
                .iter()
                .filter(|(_, info)| info.is_open())
                .map(move |(port, info)| (*protocol, *port, info))
        })
    }
}

/// Host counts for one target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    /// Distinct hosts the target expanded to.
    pub total_hosts: usize,
    /// Hosts at least one task saw up.
    pub up_hosts: usize,
}

/// Summary and host records for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub summary: TargetSummary,
    pub hosts: BTreeMap<IpAddr, HostReport>,
}

/// Run-wide figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSummary {
    /// Whether the run used soft mode.
    pub soft: bool,
    /// Completion time as a filesystem-safe slug, used to name report files.
    pub filename: String,
    /// Completion time for humans.
    pub timestamp: String,
    /// Wall-clock scan time, `H:MM:SS`.
    pub scan_time: String,
    pub scan_time_ms: u64,
    pub total_hosts: usize,
    pub up_hosts: usize,
}

impl GlobalSummary {
    pub fn new(soft: bool, elapsed: Duration, completed_at: DateTime<Local>) -> Self {
        Self {
            soft,
            filename: completed_at.format(FILENAME_FORMAT).to_string(),
            timestamp: completed_at.format(TIMESTAMP_FORMAT).to_string(),
            scan_time: format_elapsed(elapsed),
            scan_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            total_hosts: 0,
            up_hosts: 0,
        }
    }
}

/// The final merged report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub summary: GlobalSummary,
    /// Reports keyed by the user's target string.
    pub reports: BTreeMap<String, TargetReport>,
}

impl AggregatedReport {
    /// Look up one target's report.
    pub fn target(&self, target: &str) -> Option<&TargetReport> {
        self.reports.get(target)
    }
}
