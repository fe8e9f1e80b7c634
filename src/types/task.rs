//! Scan tasks: the independent units of work the dispatcher schedules.

use super::port::{PortSegment, Protocol};
use super::target::{IpVersion, ResolvedHost, Target};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How thoroughly targets are scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Every port of every protocol, split into segments.
    #[default]
    Full,
    /// Default well-known TCP ports with a faster timing profile.
    Soft,
}

impl ScanMode {
    pub fn from_soft_flag(soft: bool) -> Self {
        if soft {
            Self::Soft
        } else {
            Self::Full
        }
    }

    pub fn is_soft(self) -> bool {
        self == Self::Soft
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Soft => write!(f, "soft"),
        }
    }
}

/// One independent unit of scan work.
///
/// `ports` is `None` for soft scans, meaning "let the scanner pick its
/// default port set".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTask {
    pub target: Target,
    pub host: ResolvedHost,
    pub protocol: Protocol,
    pub ports: Option<PortSegment>,
}

impl ScanTask {
    pub fn new(
        target: Target,
        host: ResolvedHost,
        protocol: Protocol,
        ports: Option<PortSegment>,
    ) -> Self {
        Self {
            target,
            host,
            protocol,
            ports,
        }
    }

    /// IP version hint for the scanner, derived from the host address.
    pub fn ip_version(&self) -> IpVersion {
        self.host.version()
    }

    /// Whether the scanner should use its fast timing profile.
    pub fn is_soft(&self) -> bool {
        self.ports.is_none()
    }

    /// Canonical merge position of this task's result within its host.
    pub(crate) fn merge_key(&self) -> (Protocol, u16) {
        (self.protocol, self.ports.map_or(0, |p| p.start()))
    }
}

impl fmt::Display for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ports {
            Some(ports) => write!(
                f,
                "{} [{}] {} ports {}",
                self.host, self.target, self.protocol, ports
            ),
            None => write!(
                f,
                "{} [{}] {} default ports",
                self.host, self.target, self.protocol
            ),
        }
    }
}
