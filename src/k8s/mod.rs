//! Kubernetes adapters
//!
//! Live implementations of the cluster state provider, the policy source,
//! the status publisher and the event feed, backed by a `kube` client.

pub mod cluster;
pub mod policies;
pub mod watch;

pub use cluster::KubeCluster;
pub use policies::KubePolicies;
pub use watch::spawn_event_feed;
