//! Scan capability abstraction.
//!
//! The dispatcher never probes ports itself: it hands each [`ScanTask`] to a
//! [`Scanner`] and records whatever comes back. [`NmapScanner`] drives the
//! `nmap` binary; tests plug in their own implementations.

mod nmap;
mod nmap_xml;

pub use nmap::NmapScanner;

use crate::types::{PortInfo, ScanTask};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata about how a scan was run.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanInfo {
    /// Scan technique (`connect`, `syn`, `udp`...).
    #[serde(default)]
    pub method: String,
    /// Port list the scanner actually covered, in its own notation.
    #[serde(default)]
    pub services: String,
}

/// Structured outcome of one scan invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Whether the host answered.
    pub host_up: bool,
    /// Port number to service details, for the task's protocol.
    #[serde(default)]
    pub ports: BTreeMap<u16, PortInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default)]
    pub hostnames: Vec<String>,
    /// Errors reported by the scanner.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Warnings reported by the scanner.
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub scan_info: ScanInfo,
}

impl ScanOutcome {
    /// An outcome for a host that did not respond.
    pub fn down() -> Self {
        Self::default()
    }

    /// An outcome for a responsive host with no port details yet.
    pub fn up() -> Self {
        Self {
            host_up: true,
            ..Self::default()
        }
    }

    /// Add a port entry.
    pub fn with_port(mut self, port: u16, info: PortInfo) -> Self {
        self.ports.insert(port, info);
        self
    }

    /// Set the MAC address.
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    /// Add a hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostnames.push(hostname.into());
        self
    }

    /// Add an error message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Add a warning message.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// The outcome of one task, tagged with the task that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScanResult {
    pub task: ScanTask,
    pub outcome: ScanOutcome,
}

impl RawScanResult {
    pub fn new(task: ScanTask, outcome: ScanOutcome) -> Self {
        Self { task, outcome }
    }
}

/// Trait for scan capability implementations.
///
/// `scan` returns `None` when the invocation produced nothing usable
/// (tool crash, unparsable output...). The dispatcher drops such tasks.
/// An unreachable host is not a failure: it is `Some` with `host_up` unset.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this scanner runs with elevated privileges.
    fn requires_privileges(&self) -> bool;

    /// Scan one host for one protocol and port segment.
    async fn scan(&self, task: &ScanTask) -> Option<ScanOutcome>;
}
