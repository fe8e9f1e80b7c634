//! Core type definitions using newtype patterns for type safety.
//!
//! These types carry data between the resolver, partitioner, dispatcher and
//! aggregator.

mod port;
mod target;
mod task;

pub use port::{PortError, PortInfo, PortSegment, Protocol};
pub use target::{
    expand_network, network_size, IpVersion, ResolvedHost, ResolvedTarget, Target, TargetError,
    TargetSpec,
};
pub use task::{ScanMode, ScanTask};
