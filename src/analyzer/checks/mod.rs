//! Rule evaluators.
//!
//! Each submodule is a group of pure functions from resource collections to
//! findings. None of them perform I/O or share state.

pub mod imds;
pub mod namespace;
pub mod network;
pub mod rbac;
pub mod workload;

pub use imds::ProbeOutcome;
pub use network::NetworkInputs;
pub use workload::ServiceAccountIndex;
