//! Cluster state model for orphan auditing
//!
//! Resource kinds, typed objects, the read-only cluster state interface and
//! its in-memory and manifest-backed sources.

pub mod cancel;
pub mod error;
pub mod kinds;
pub mod manifest;
pub mod memory;
pub mod object;
pub mod reader;
pub mod state;

pub use cancel::Cancellation;
pub use error::ClusterError;
pub use kinds::{CandidateKind, ResourceKind, TargetKind, UnsupportedKind};
pub use manifest::{ManifestError, ManifestLoader};
pub use memory::InMemoryCluster;
pub use object::{ClusterObject, ObjectRef};
pub use reader::ClusterReader;
pub use state::{ClusterState, Scope};

pub use k8s_openapi;
