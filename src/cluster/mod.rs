//! Everything that talks to the network: live collection through the
//! Kubernetes API and the metadata-service probe.

pub mod client;
pub mod probe;

pub use client::{ClusterClient, Collected, DEFAULT_PAGE_SIZE};
pub use probe::probe_imds;
