//! Events that trigger reconciliation

use orphanage_cluster::ResourceKind;
use std::fmt;

use crate::policy::PolicyKey;

/// A change observed in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterEvent {
    /// A policy was created, updated or deleted
    Policy { key: PolicyKey, deleted: bool },

    /// An object of a monitored or candidate kind changed.
    ///
    /// Any candidate kind can embed any target kind, so these re-evaluate
    /// every policy.
    Resource { kind: ResourceKind },
}

impl ClusterEvent {
    pub fn policy_changed(key: PolicyKey) -> Self {
        ClusterEvent::Policy {
            key,
            deleted: false,
        }
    }

    pub fn policy_deleted(key: PolicyKey) -> Self {
        ClusterEvent::Policy { key, deleted: true }
    }

    pub fn resource(kind: ResourceKind) -> Self {
        ClusterEvent::Resource { kind }
    }
}

impl fmt::Display for ClusterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterEvent::Policy { key, deleted: false } => write!(f, "policy {key} changed"),
            ClusterEvent::Policy { key, deleted: true } => write!(f, "policy {key} deleted"),
            ClusterEvent::Resource { kind } => write!(f, "{kind} changed"),
        }
    }
}
