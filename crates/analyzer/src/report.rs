//! Orphan reports

use chrono::{DateTime, Utc};
use orphanage_cluster::TargetKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A target with no inbound references
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Orphan {
    pub kind: TargetKind,
    pub name: String,
}

impl fmt::Display for Orphan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Result of one evaluation of a namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanReport {
    /// Evaluated namespace
    pub namespace: String,

    /// When the evaluation finished
    pub evaluated_at: DateTime<Utc>,

    /// Number of entries in `orphans`
    pub orphan_count: usize,

    /// Number of targets that were checked
    pub targets_evaluated: usize,

    /// Orphans in monitored-kind order, sorted by name within each kind
    pub orphans: Vec<Orphan>,
}

impl OrphanReport {
    pub fn new(
        namespace: impl Into<String>,
        targets_evaluated: usize,
        orphans: Vec<Orphan>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            evaluated_at: Utc::now(),
            orphan_count: orphans.len(),
            targets_evaluated,
            orphans,
        }
    }

    /// Whether two reports agree on everything but the evaluation time
    pub fn same_findings(&self, other: &OrphanReport) -> bool {
        self.namespace == other.namespace
            && self.orphan_count == other.orphan_count
            && self.targets_evaluated == other.targets_evaluated
            && self.orphans == other.orphans
    }

    pub fn is_orphaned(&self, kind: TargetKind, name: &str) -> bool {
        self.orphans
            .iter()
            .any(|orphan| orphan.kind == kind && orphan.name == name)
    }
}
