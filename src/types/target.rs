//! Target specification types with CIDR and hostname support.
//!
//! Provides flexible target parsing supporting:
//! - Single IP addresses (IPv4 and IPv6)
//! - CIDR notation, relaxed: host bits may be set (`192.168.1.7/24`)
//! - Hostnames (example.com)

use ipnetwork::IpNetwork;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

/// A target exactly as the user supplied it.
///
/// Used as the grouping key of the final report, so it is never normalized
/// beyond trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Create a target from user input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    /// The target string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Target {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// IP address family of a resolved host.
///
/// Serialized as the bare number `4` or `6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Family of the given address.
    pub const fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Numeric version, 4 or 6.
    pub const fn number(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V6 => 6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv{}", self.number())
    }
}

impl Serialize for IpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.number())
    }
}

impl<'de> Deserialize<'de> for IpVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            other => Err(serde::de::Error::custom(format!(
                "invalid IP version: {}",
                other
            ))),
        }
    }
}

/// One concrete address derived from a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolvedHost {
    pub ip: IpAddr,
}

impl ResolvedHost {
    pub fn new(ip: IpAddr) -> Self {
        Self { ip }
    }

    /// Address family of this host.
    pub fn version(&self) -> IpVersion {
        IpVersion::of(&self.ip)
    }
}

impl fmt::Display for ResolvedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ip)
    }
}

/// A target together with every host it expanded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target: Target,
    /// Family of the network or address the target resolved to.
    pub version: IpVersion,
    /// Unique hosts, in expansion order.
    pub hosts: Vec<ResolvedHost>,
}

impl ResolvedTarget {
    /// Build a resolved target, dropping duplicate hosts but keeping the
    /// first-seen order.
    pub fn new(target: Target, version: IpVersion, hosts: Vec<ResolvedHost>) -> Self {
        let mut seen = HashSet::with_capacity(hosts.len());
        let hosts = hosts.into_iter().filter(|h| seen.insert(*h)).collect();
        Self {
            target,
            version,
            hosts,
        }
    }
}

/// Error type for target parsing and resolution.
///
/// Every variant is fatal to a run: targets must be known before any task is
/// built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: '{0}'")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: '{0}'")]
    InvalidCidr(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
    #[error("network '{0}' holds {1} addresses (max: {2})")]
    NetworkTooLarge(String, u128, u128),
}

/// A parsed target before any DNS work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A network in CIDR notation. Host bits are preserved as typed.
    Network(IpNetwork),
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::InvalidFormat(s.to_string()));
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::Network(network));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Network(network) => write!(f, "{}", network),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Number of addresses covered by a network, network and broadcast included.
pub fn network_size(network: &IpNetwork) -> u128 {
    let host_bits = match network {
        IpNetwork::V4(net) => 32 - u32::from(net.prefix()),
        IpNetwork::V6(net) => 128 - u32::from(net.prefix()),
    };
    if host_bits >= 128 {
        u128::MAX
    } else {
        1u128 << host_bits
    }
}

/// Expand a network into every address it covers.
///
/// Iteration starts at the network base even when the CIDR was written with
/// host bits set.
pub fn expand_network(network: IpNetwork, limit: u128) -> Result<Vec<ResolvedHost>, TargetError> {
    let size = network_size(&network);
    if size > limit {
        return Err(TargetError::NetworkTooLarge(
            network.to_string(),
            size,
            limit,
        ));
    }
    Ok(network.iter().map(ResolvedHost::new).collect())
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label.chars().next().is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_alphanumeric()) {
            return false;
        }
        if !label
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_parse_ipv4() {
        let spec = TargetSpec::parse("192.168.1.1").unwrap();
        assert!(matches!(spec, TargetSpec::Single(IpAddr::V4(_))));
    }

    #[test]
    fn test_parse_ipv6() {
        let spec = TargetSpec::parse(" ::1 ").unwrap();
        assert_eq!(spec, TargetSpec::Single(IpAddr::V6(Ipv6Addr::LOCALHOST)));
    }

    #[test]
    fn test_parse_relaxed_cidr() {
        let spec = TargetSpec::parse("192.168.1.77/24").unwrap();
        let TargetSpec::Network(network) = spec else {
            panic!("expected a network");
        };
        assert_eq!(network.prefix(), 24);
        assert_eq!(network_size(&network), 256);
    }

    #[test]
    fn test_parse_hostname_and_garbage() {
        assert!(matches!(
            TargetSpec::parse("scanme.nmap.org").unwrap(),
            TargetSpec::Hostname(_)
        ));
        assert!(matches!(
            TargetSpec::parse("10.0.0.0/33"),
            Err(TargetError::InvalidCidr(_))
        ));
        assert!(matches!(
            TargetSpec::parse("not a host"),
            Err(TargetError::InvalidFormat(_))
        ));
        assert!(matches!(
            TargetSpec::parse("   "),
            Err(TargetError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_expand_relaxed_cidr_covers_whole_network() {
        let network: IpNetwork = "10.1.2.3/29".parse().unwrap();
        let hosts = expand_network(network, 65536).unwrap();

        assert_eq!(hosts.len() as u128, network_size(&network));
        assert_eq!(hosts[0].ip, IpAddr::V4(Ipv4Addr::new(10, 1, 2, 0)));
        assert_eq!(hosts[7].ip, IpAddr::V4(Ipv4Addr::new(10, 1, 2, 7)));
        for host in &hosts {
            assert!(host.ip.to_string().parse::<IpAddr>().is_ok());
        }
    }

    #[test]
    fn test_expand_ipv6_network() {
        let network: IpNetwork = "2001:db8::5/126".parse().unwrap();
        let hosts = expand_network(network, 65536).unwrap();
        assert_eq!(hosts.len(), 4);
        assert!(hosts.iter().all(|h| h.version() == IpVersion::V6));
    }

    #[test]
    fn test_expand_rejects_oversized_network() {
        let network: IpNetwork = "2001:db8::/64".parse().unwrap();
        assert!(matches!(
            expand_network(network, 65536),
            Err(TargetError::NetworkTooLarge(_, _, 65536))
        ));
    }

    #[test]
    fn test_resolved_target_dedups_hosts() {
        let a = ResolvedHost::new("10.0.0.1".parse().unwrap());
        let b = ResolvedHost::new("10.0.0.2".parse().unwrap());
        let resolved = ResolvedTarget::new(Target::new("x"), IpVersion::V4, vec![a, b, a]);
        assert_eq!(resolved.hosts, vec![a, b]);
    }

    #[test]
    fn test_ip_version_serializes_as_number() {
        assert_eq!(serde_json::to_string(&IpVersion::V6).unwrap(), "6");
        let parsed: IpVersion = serde_json::from_str("4").unwrap();
        assert_eq!(parsed, IpVersion::V4);
        assert!(serde_json::from_str::<IpVersion>("5").is_err());
    }

    #[test]
    fn test_valid_hostname() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("example.com."));
        assert!(is_valid_hostname("my-server"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-invalid.com"));
    }
}
