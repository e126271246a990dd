//! Cluster state provider interface

use async_trait::async_trait;
use std::fmt;

use crate::error::ClusterError;
use crate::kinds::ResourceKind;
use crate::object::ClusterObject;

/// Where a list call looks
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A single namespace
    Namespace(String),

    /// Every namespace, or the cluster scope for cluster-scoped kinds
    Cluster,
}

impl Scope {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Scope::Namespace(namespace) => Some(namespace),
            Scope::Cluster => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Namespace(namespace) => write!(f, "namespace {namespace}"),
            Scope::Cluster => f.write_str("cluster"),
        }
    }
}

/// Read-only access to cluster state.
///
/// This is the sole source of truth for an evaluation. Implementations must
/// return objects of the requested kind only.
#[async_trait]
pub trait ClusterState: Send + Sync {
    /// List every object of `kind` in `scope`
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Vec<ClusterObject>, ClusterError>;

    /// Fetch one object, `Ok(None)` when it does not exist
    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ClusterObject>, ClusterError>;
}
