//! nmap-backed scanner.
//!
//! Runs one nmap process per task with XML output on stdout, then maps the
//! document onto a [`ScanOutcome`]. Version detection is always on
//! (`-sTV` / `-sUV`); soft tasks add the `-T4` timing template instead of an
//! explicit port list.
//!
//! # Privileges
//!
//! MAC addresses are only reported when nmap runs as root, so the scanner
//! prefixes the command with `sudo` unless told otherwise.

use super::nmap_xml::{self, NmapRun, XmlHost};
use super::{ScanInfo, ScanOutcome, Scanner};
use crate::error::{ScanError, ScanResult};
use crate::types::{IpVersion, PortInfo, ScanTask};
use async_trait::async_trait;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Scanner that shells out to nmap.
#[derive(Debug, Clone)]
pub struct NmapScanner {
    binary: PathBuf,
    use_sudo: bool,
}

impl NmapScanner {
    /// Create a scanner for the nmap binary at `binary`.
    ///
    /// The path is used as given; only that location is ever executed.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            use_sudo: true,
        }
    }

    /// Enable or disable the `sudo` prefix.
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// nmap arguments for a task, target address last.
    pub fn arguments(task: &ScanTask) -> Vec<String> {
        let mut args = vec![
            "-oX".to_string(),
            "-".to_string(),
            format!("-s{}V", task.protocol.nmap_letter()),
        ];

        args.push(match task.ip_version() {
            IpVersion::V4 => "-4".to_string(),
            IpVersion::V6 => "-6".to_string(),
        });

        match task.ports {
            Some(segment) => {
                args.push("-p".to_string());
                args.push(segment.to_string());
            }
            None => args.push("-T4".to_string()),
        }

        args.push(task.host.ip.to_string());
        args
    }

    fn command(&self, task: &ScanTask) -> Command {
        let mut command = if self.use_sudo {
            let mut command = Command::new("sudo");
            command.arg(&self.binary);
            command
        } else {
            Command::new(&self.binary)
        };

        command
            .args(Self::arguments(task))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    async fn run(&self, task: &ScanTask) -> ScanResult<ScanOutcome> {
        let output = self.command(task).output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if stdout.trim().is_empty() {
            return Err(ScanError::EmptyOutput {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let run = nmap_xml::parse(&stdout)?;
        Ok(build_outcome(task, &run, &stderr))
    }
}

#[async_trait]
impl Scanner for NmapScanner {
    fn name(&self) -> &'static str {
        "nmap"
    }

    fn requires_privileges(&self) -> bool {
        self.use_sudo
    }

    async fn scan(&self, task: &ScanTask) -> Option<ScanOutcome> {
        debug!(task = %task, binary = %self.binary.display(), "invoking nmap");
        match self.run(task).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(task = %task, error = %e, "nmap produced no usable result");
                None
            }
        }
    }
}

/// Map a parsed document onto the outcome for `task`'s host and protocol.
fn build_outcome(task: &ScanTask, run: &NmapRun, stderr: &str) -> ScanOutcome {
    let (errors, warnings) = split_stderr(stderr);
    let scan_info = run
        .scan_info
        .first()
        .map(|info| ScanInfo {
            method: info.kind.clone(),
            services: info.services.clone(),
        })
        .unwrap_or_default();

    let mut outcome = ScanOutcome {
        errors,
        warnings,
        scan_info,
        ..ScanOutcome::default()
    };

    let Some(host) = find_host(run, &task.host.ip) else {
        return outcome;
    };

    outcome.host_up = host.is_up();
    outcome.mac = host.address("mac").map(str::to_string);

    if let Some(hostnames) = &host.hostnames {
        outcome.hostnames = hostnames
            .hostnames
            .iter()
            .filter(|h| !h.name.is_empty())
            .map(|h| h.name.clone())
            .collect();
    }

    let protocol = task.protocol.to_string().to_ascii_lowercase();
    if let Some(ports) = &host.ports {
        for port in ports.ports.iter().filter(|p| p.protocol == protocol) {
            let mut info = PortInfo {
                state: port.state.state.clone(),
                reason: port.state.reason.clone(),
                ..PortInfo::default()
            };
            if let Some(service) = &port.service {
                info.name = service.name.clone();
                info.product = service.product.clone();
                info.version = service.version.clone();
                info.extrainfo = service.extrainfo.clone();
                info.conf = service.conf.clone();
                info.cpe = service.cpe.join(" ");
            }
            outcome.ports.insert(port.port_id, info);
        }
    }

    outcome
}

/// The document entry for `ip`, compared as addresses so IPv6 spelling
/// differences do not matter.
fn find_host<'a>(run: &'a NmapRun, ip: &IpAddr) -> Option<&'a XmlHost> {
    run.hosts.iter().find(|host| {
        host.addresses
            .iter()
            .filter(|a| a.addr_type == "ipv4" || a.addr_type == "ipv6")
            .any(|a| a.addr.parse::<IpAddr>().is_ok_and(|addr| &addr == ip))
    })
}

/// Split stderr into (errors, warnings). Lines starting with `Warning:` are
/// warnings; any other non-empty line is an error.
fn split_stderr(stderr: &str) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for line in stderr.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("Warning:") {
            warnings.push(line.to_string());
        } else {
            errors.push(line.to_string());
        }
    }
    (errors, warnings)
}
