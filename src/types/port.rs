//! Port segments, transport protocols and per-port service details.
//!
//! `PortSegment` is the unit the partitioner hands to a scan task. Unlike a
//! user-facing port list it may start at port 0, since segments tile the
//! whole `[0, max_port]` space.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport protocol probed by a scan task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Every protocol a full scan covers, in report order.
    pub const ALL: [Protocol; 2] = [Protocol::Tcp, Protocol::Udp];

    /// Letter nmap expects after `-s` for this protocol.
    pub const fn nmap_letter(self) -> char {
        match self {
            Self::Tcp => 'T',
            Self::Udp => 'U',
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

/// Error type for port segment construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("invalid port segment: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
}

/// An inclusive range of ports scanned by a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortSegment {
    start: u16,
    end: u16,
}

impl PortSegment {
    /// Create a new segment covering `start..=end`.
    pub fn new(start: u16, end: u16) -> Result<Self, PortError> {
        if start > end {
            Err(PortError::InvalidRange(start, end))
        } else {
            Ok(Self { start, end })
        }
    }

    /// First port of the segment.
    pub const fn start(&self) -> u16 {
        self.start
    }

    /// Last port of the segment (inclusive).
    pub const fn end(&self) -> u16 {
        self.end
    }

    /// Number of ports in this segment.
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    /// A valid segment always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `port` falls inside this segment.
    pub const fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }
}

impl fmt::Display for PortSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Service details reported for one port.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortInfo {
    /// Port state as reported by the scanner (`open`, `closed`, `filtered`...).
    pub state: String,
    /// Why the scanner chose that state (`syn-ack`, `conn-refused`...).
    #[serde(default)]
    pub reason: String,
    /// Service name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub extrainfo: String,
    /// Detection confidence, 0-10.
    #[serde(default)]
    pub conf: String,
    #[serde(default)]
    pub cpe: String,
}

impl PortInfo {
    /// Create port info with just a state and service name.
    pub fn new(state: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Whether the port accepted traffic.
    pub fn is_open(&self) -> bool {
        self.state == "open" || self.state == "open|filtered"
    }
}
