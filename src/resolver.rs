//! Target resolution: raw target strings to concrete hosts.
//!
//! Addresses and networks are expanded locally. Hostnames go through a
//! single DNS lookup; the first address returned is then classified like any
//! literal address.

use crate::types::{
    expand_network, IpVersion, ResolvedHost, ResolvedTarget, Target, TargetError, TargetSpec,
};
use async_trait::async_trait;
use std::net::IpAddr;
use tracing::{debug, info};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Maximum number of addresses a single target may expand to by default.
pub const DEFAULT_MAX_HOSTS_PER_TARGET: u128 = 65536;

/// Name lookup backend.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Return the first address `hostname` resolves to.
    async fn lookup(&self, hostname: &str) -> Result<IpAddr, TargetError>;
}

/// DNS lookup through the system resolver configuration.
pub struct DnsLookup {
    resolver: TokioAsyncResolver,
}

impl DnsLookup {
    /// Build a resolver from the system configuration, falling back to the
    /// library defaults when it cannot be read.
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            debug!(error = %e, "system resolver config unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

impl Default for DnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostLookup for DnsLookup {
    async fn lookup(&self, hostname: &str) -> Result<IpAddr, TargetError> {
        let response = self
            .resolver
            .lookup_ip(hostname)
            .await
            .map_err(|e| TargetError::DnsResolutionFailed(hostname.to_string(), e.to_string()))?;

        response
            .iter()
            .next()
            .ok_or_else(|| TargetError::NoAddressesFound(hostname.to_string()))
    }
}

/// Turns target strings into resolved host lists.
pub struct Resolver<L = DnsLookup> {
    lookup: L,
    max_hosts: u128,
}

impl Resolver<DnsLookup> {
    /// Resolver backed by system DNS.
    pub fn new() -> Self {
        Self::with_lookup(DnsLookup::new())
    }
}

impl Default for Resolver<DnsLookup> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: HostLookup> Resolver<L> {
    /// Resolver backed by a custom lookup.
    pub fn with_lookup(lookup: L) -> Self {
        Self {
            lookup,
            max_hosts: DEFAULT_MAX_HOSTS_PER_TARGET,
        }
    }

    /// Cap the number of addresses one target may expand to.
    pub fn with_max_hosts(mut self, max_hosts: u128) -> Self {
        self.max_hosts = max_hosts;
        self
    }

    /// Resolve one target.
    pub async fn resolve(&self, target: &Target) -> Result<ResolvedTarget, TargetError> {
        let spec = TargetSpec::parse(target.as_str())?;

        let (version, hosts) = match spec {
            TargetSpec::Single(ip) => (IpVersion::of(&ip), vec![ResolvedHost::new(ip)]),
            TargetSpec::Network(network) => {
                let version = IpVersion::of(&network.ip());
                (version, expand_network(network, self.max_hosts)?)
            }
            TargetSpec::Hostname(hostname) => {
                let ip = self.lookup.lookup(&hostname).await?;
                debug!(%hostname, %ip, "hostname resolved");
                (IpVersion::of(&ip), vec![ResolvedHost::new(ip)])
            }
        };

        Ok(ResolvedTarget::new(target.clone(), version, hosts))
    }

    /// Resolve every target, stopping at the first failure.
    pub async fn resolve_all(&self, targets: &[Target]) -> Result<Vec<ResolvedTarget>, TargetError> {
        let mut resolved = Vec::with_capacity(targets.len());
        for target in targets {
            let entry = self.resolve(target).await?;
            info!(
                target = %entry.target,
                hosts = entry.hosts.len(),
                version = %entry.version,
                "target resolved"
            );
            resolved.push(entry);
        }
        Ok(resolved)
    }
}
