//! The `OrphanagePolicy` custom resource

use kube::{CustomResource, ResourceExt};
use orphanage_analyzer::OrphanReport;
use orphanage_cluster::{TargetKind, UnsupportedKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kinds to audit for orphans in the policy's own namespace
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "orphanage.dev",
    version = "v1alpha1",
    kind = "OrphanagePolicy",
    namespaced,
    status = "OrphanagePolicyStatus",
    shortname = "orphpol",
    printcolumn = r#"{"name":"Orphans","type":"integer","jsonPath":".status.orphanCount"}"#,
    printcolumn = r#"{"name":"Changed","type":"string","jsonPath":".status.lastChanged"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct OrphanagePolicySpec {
    /// Monitored kinds, e.g. `["Secret", "ConfigMap"]`
    #[serde(default)]
    pub resource_types: Vec<String>,
}

/// Observed orphans, written only after a fully successful pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrphanagePolicyStatus {
    #[serde(default)]
    pub orphan_count: usize,

    /// When the orphan list last changed (RFC 3339)
    #[serde(default)]
    pub last_changed: Option<String>,

    #[serde(default)]
    pub orphans: Vec<OrphanEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OrphanEntry {
    pub kind: String,
    pub name: String,
}

impl OrphanagePolicyStatus {
    /// Status reflecting `report`.
    ///
    /// `lastChanged` only moves when the orphan list differs from `previous`.
    pub fn from_report(previous: Option<&OrphanagePolicyStatus>, report: &OrphanReport) -> Self {
        let orphans: Vec<OrphanEntry> = report
            .orphans
            .iter()
            .map(|orphan| OrphanEntry {
                kind: orphan.kind.label().to_string(),
                name: orphan.name.clone(),
            })
            .collect();

        let last_changed = match previous {
            Some(previous) if previous.orphans == orphans && previous.last_changed.is_some() => {
                previous.last_changed.clone()
            }
            _ => Some(report.evaluated_at.to_rfc3339()),
        };

        Self {
            orphan_count: orphans.len(),
            last_changed,
            orphans,
        }
    }
}

impl OrphanagePolicy {
    /// Kinds this policy monitors, rejecting anything that is not a
    /// monitorable target kind
    pub fn monitored_kinds(&self) -> Result<Vec<TargetKind>, UnsupportedKind> {
        self.spec
            .resource_types
            .iter()
            .map(|label| TargetKind::parse_monitored(label))
            .collect()
    }

    /// Identity of this policy; `None` until it has a name and namespace
    pub fn key(&self) -> Option<PolicyKey> {
        Some(PolicyKey::new(self.namespace()?, self.name_any()))
    }
}

/// Namespace and name of a policy
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PolicyKey {
    pub namespace: String,
    pub name: String,
}

impl PolicyKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for PolicyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A policy object named `name` in `namespace`
pub fn new_policy(namespace: &str, name: &str, resource_types: &[&str]) -> OrphanagePolicy {
    let mut policy = OrphanagePolicy::new(
        name,
        OrphanagePolicySpec {
            resource_types: resource_types.iter().map(|kind| kind.to_string()).collect(),
        },
    );
    policy.metadata.namespace = Some(namespace.to_string());
    policy
}
