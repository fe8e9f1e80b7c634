//! Task partitioning: resolved hosts and scan mode to independent tasks.
//!
//! A full scan tiles `[0, max_port]` into fixed-width segments per host and
//! protocol; a soft scan produces a single TCP task per host and leaves port
//! selection to the scanner.

use crate::types::{PortSegment, Protocol, ResolvedTarget, ScanMode, ScanTask};

/// Default width of a port segment.
pub const DEFAULT_PORT_STEPS: u16 = 1000;
/// Default highest port scanned.
pub const DEFAULT_MAX_PORT: u16 = 65535;

/// Knobs for splitting a full scan.
#[derive(Debug, Clone)]
pub struct PartitionConfig {
    /// Width of each port segment. Must be non-zero.
    pub port_steps: u16,
    /// Highest port scanned.
    pub max_port: u16,
    /// Protocols covered by a full scan.
    pub protocols: Vec<Protocol>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            port_steps: DEFAULT_PORT_STEPS,
            max_port: DEFAULT_MAX_PORT,
            protocols: Protocol::ALL.to_vec(),
        }
    }
}

impl PartitionConfig {
    pub fn new(port_steps: u16, max_port: u16) -> Self {
        Self {
            port_steps,
            max_port,
            ..Self::default()
        }
    }
}

/// Segment boundaries `0, steps, 2*steps, ..., max_port`.
///
/// The last boundary is always `max_port`, even when it is not a multiple
/// of `steps`. Returns an empty list when `steps` is zero.
pub fn port_boundaries(port_steps: u16, max_port: u16) -> Vec<u16> {
    if port_steps == 0 {
        return Vec::new();
    }

    let mut boundaries: Vec<u16> = (0..=max_port).step_by(usize::from(port_steps)).collect();
    if boundaries.last() != Some(&max_port) {
        boundaries.push(max_port);
    }
    boundaries
}

/// Disjoint segments covering `[0, max_port]` exactly once.
///
/// Each adjacent boundary pair yields one segment. All but the last stop one
/// port short of the next boundary so that no port is scanned twice.
pub fn port_segments(port_steps: u16, max_port: u16) -> Vec<PortSegment> {
    let boundaries = port_boundaries(port_steps, max_port);
    if boundaries.len() == 1 {
        // max_port == 0
        return PortSegment::new(0, 0).into_iter().collect();
    }

    let last = boundaries.len().saturating_sub(2);
    boundaries
        .windows(2)
        .enumerate()
        .filter_map(|(index, pair)| {
            let end = if index == last { pair[1] } else { pair[1] - 1 };
            PortSegment::new(pair[0], end).ok()
        })
        .collect()
}

/// Build every scan task for the resolved targets.
pub fn partition(
    targets: &[ResolvedTarget],
    mode: ScanMode,
    config: &PartitionConfig,
) -> Vec<ScanTask> {
    let segments = match mode {
        ScanMode::Soft => Vec::new(),
        ScanMode::Full => port_segments(config.port_steps, config.max_port),
    };

    let mut tasks = Vec::new();
    for resolved in targets {
        for host in &resolved.hosts {
            match mode {
                ScanMode::Soft => tasks.push(ScanTask::new(
                    resolved.target.clone(),
                    *host,
                    Protocol::Tcp,
                    None,
                )),
                ScanMode::Full => {
                    for &protocol in &config.protocols {
                        tasks.extend(segments.iter().map(|segment| {
                            ScanTask::new(resolved.target.clone(), *host, protocol, Some(*segment))
                        }));
                    }
                }
            }
        }
    }
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IpVersion, ResolvedHost, Target};

    fn assert_exact_cover(segments: &[PortSegment], max_port: u16) {
        assert_eq!(segments.first().map(|s| s.start()), Some(0));
        assert_eq!(segments.last().map(|s| s.end()), Some(max_port));
        for pair in segments.windows(2) {
            assert_eq!(u32::from(pair[0].end()) + 1, u32::from(pair[1].start()));
        }
        let covered: usize = segments.iter().map(|s| s.len()).sum();
        assert_eq!(covered, usize::from(max_port) + 1);
    }

    fn single_host(target: &str) -> ResolvedTarget {
        let host = ResolvedHost::new(target.parse().unwrap());
        ResolvedTarget::new(Target::new(target), host.version(), vec![host])
    }

    #[test]
    fn test_boundaries_force_max_port() {
        assert_eq!(port_boundaries(1000, 2500), vec![0, 1000, 2000, 2500]);
        assert_eq!(port_boundaries(1000, 2000), vec![0, 1000, 2000]);
        assert_eq!(port_boundaries(5000, 100), vec![0, 100]);
        assert!(port_boundaries(0, 100).is_empty());
    }

    #[test]
    fn test_default_segments() {
        let segments = port_segments(DEFAULT_PORT_STEPS, DEFAULT_MAX_PORT);
        assert_eq!(segments.len(), 66);
        assert_eq!(segments[0].to_string(), "0-999");
        assert_eq!(segments[65].to_string(), "65000-65535");
        assert_exact_cover(&segments, DEFAULT_MAX_PORT);
    }

    #[test]
    fn test_segments_partition_port_space() {
        for &(steps, max_port) in &[
            (1, 10),
            (3, 10),
            (7, 7),
            (1000, 999),
            (1000, 1000),
            (1000, 1001),
            (4096, 65535),
            (65535, 65535),
            (u16::MAX, 12),
        ] {
            assert_exact_cover(&port_segments(steps, max_port), max_port);
        }
    }

    #[test]
    fn test_zero_max_port() {
        let segments = port_segments(1000, 0);
        assert_eq!(segments, vec![PortSegment::new(0, 0).unwrap()]);
    }

    #[test]
    fn test_full_mode_single_host() {
        let targets = vec![single_host("203.0.113.5")];
        let tasks = partition(&targets, ScanMode::Full, &PartitionConfig::new(1000, 2500));

        assert_eq!(tasks.len(), 6);
        let ranges: Vec<(Protocol, String)> = tasks
            .iter()
            .map(|t| (t.protocol, t.ports.map(|p| p.to_string()).unwrap_or_default()))
            .collect();
        assert_eq!(
            ranges,
            vec![
                (Protocol::Tcp, "0-999".to_string()),
                (Protocol::Tcp, "1000-1999".to_string()),
                (Protocol::Tcp, "2000-2500".to_string()),
                (Protocol::Udp, "0-999".to_string()),
                (Protocol::Udp, "1000-1999".to_string()),
                (Protocol::Udp, "2000-2500".to_string()),
            ]
        );
        assert!(tasks.iter().all(|t| t.ip_version() == IpVersion::V4));
    }

    #[test]
    fn test_soft_mode_one_tcp_task_per_host() {
        let hosts: Vec<ResolvedHost> = (0..4)
            .map(|i| ResolvedHost::new(format!("198.51.100.{}", i).parse().unwrap()))
            .collect();
        let targets = vec![ResolvedTarget::new(
            Target::new("198.51.100.0/30"),
            IpVersion::V4,
            hosts,
        )];

        let tasks = partition(&targets, ScanMode::Soft, &PartitionConfig::default());
        assert_eq!(tasks.len(), 4);
        assert!(tasks
            .iter()
            .all(|t| t.protocol == Protocol::Tcp && t.ports.is_none()));
    }

    #[test]
    fn test_empty_targets() {
        assert!(partition(&[], ScanMode::Full, &PartitionConfig::default()).is_empty());
    }
}
