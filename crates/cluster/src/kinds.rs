//! Fixed enumerations of the resource kinds the auditor knows about

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A kind label that is not part of the fixed enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported resource kind: {0}")]
pub struct UnsupportedKind(pub String);

/// Every API kind that is read from cluster state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Secret,
    ConfigMap,
    Service,
    Pod,
    Deployment,
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    Job,
    CronJob,
    Ingress,
    ServiceAccount,
    ValidatingWebhookConfiguration,
    MutatingWebhookConfiguration,
    #[serde(rename = "APIService")]
    ApiService,
    CustomResourceDefinition,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 16] = [
        ResourceKind::Secret,
        ResourceKind::ConfigMap,
        ResourceKind::Service,
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::StatefulSet,
        ResourceKind::DaemonSet,
        ResourceKind::ReplicaSet,
        ResourceKind::Job,
        ResourceKind::CronJob,
        ResourceKind::Ingress,
        ResourceKind::ServiceAccount,
        ResourceKind::ValidatingWebhookConfiguration,
        ResourceKind::MutatingWebhookConfiguration,
        ResourceKind::ApiService,
        ResourceKind::CustomResourceDefinition,
    ];

    /// The Kubernetes `kind` string
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Service => "Service",
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::ReplicaSet => "ReplicaSet",
            ResourceKind::Job => "Job",
            ResourceKind::CronJob => "CronJob",
            ResourceKind::Ingress => "Ingress",
            ResourceKind::ServiceAccount => "ServiceAccount",
            ResourceKind::ValidatingWebhookConfiguration => "ValidatingWebhookConfiguration",
            ResourceKind::MutatingWebhookConfiguration => "MutatingWebhookConfiguration",
            ResourceKind::ApiService => "APIService",
            ResourceKind::CustomResourceDefinition => "CustomResourceDefinition",
        }
    }

    /// Whether objects of this kind live inside a namespace
    pub fn is_namespaced(&self) -> bool {
        !matches!(
            self,
            ResourceKind::ValidatingWebhookConfiguration
                | ResourceKind::MutatingWebhookConfiguration
                | ResourceKind::ApiService
                | ResourceKind::CustomResourceDefinition
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResourceKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| UnsupportedKind(s.to_string()))
    }
}

/// Kinds that can be the target of a reference lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    Secret,
    ConfigMap,
    Service,
    Pod,
}

impl TargetKind {
    pub const ALL: [TargetKind; 4] = [
        TargetKind::Secret,
        TargetKind::ConfigMap,
        TargetKind::Service,
        TargetKind::Pod,
    ];

    /// Kinds a policy may ask to be monitored for orphans
    pub const MONITORABLE: [TargetKind; 2] = [TargetKind::Secret, TargetKind::ConfigMap];

    pub fn label(&self) -> &'static str {
        ResourceKind::from(*self).label()
    }

    pub fn is_monitorable(&self) -> bool {
        TargetKind::MONITORABLE.contains(self)
    }

    /// Parse a kind label that a policy lists as monitored.
    ///
    /// Anything outside the monitorable set is rejected, including kinds that
    /// are valid lookup targets but never orphan candidates.
    pub fn parse_monitored(label: &str) -> Result<Self, UnsupportedKind> {
        label
            .parse::<TargetKind>()
            .ok()
            .filter(TargetKind::is_monitorable)
            .ok_or_else(|| UnsupportedKind(label.to_string()))
    }
}

impl From<TargetKind> for ResourceKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Secret => ResourceKind::Secret,
            TargetKind::ConfigMap => ResourceKind::ConfigMap,
            TargetKind::Service => ResourceKind::Service,
            TargetKind::Pod => ResourceKind::Pod,
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TargetKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| UnsupportedKind(s.to_string()))
    }
}

/// Kinds whose objects may structurally reference a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    Pod,
    Deployment,
    StatefulSet,
    DaemonSet,
    ReplicaSet,
    Job,
    CronJob,
    Ingress,
    ServiceAccount,
    Service,
    ValidatingWebhookConfiguration,
    MutatingWebhookConfiguration,
    #[serde(rename = "APIService")]
    ApiService,
    CustomResourceDefinition,
}

impl CandidateKind {
    pub const ALL: [CandidateKind; 14] = [
        CandidateKind::Pod,
        CandidateKind::Deployment,
        CandidateKind::StatefulSet,
        CandidateKind::DaemonSet,
        CandidateKind::ReplicaSet,
        CandidateKind::Job,
        CandidateKind::CronJob,
        CandidateKind::Ingress,
        CandidateKind::ServiceAccount,
        CandidateKind::Service,
        CandidateKind::ValidatingWebhookConfiguration,
        CandidateKind::MutatingWebhookConfiguration,
        CandidateKind::ApiService,
        CandidateKind::CustomResourceDefinition,
    ];

    pub fn label(&self) -> &'static str {
        ResourceKind::from(*self).label()
    }

    pub fn is_namespaced(&self) -> bool {
        ResourceKind::from(*self).is_namespaced()
    }
}

impl From<CandidateKind> for ResourceKind {
    fn from(kind: CandidateKind) -> Self {
        match kind {
            CandidateKind::Pod => ResourceKind::Pod,
            CandidateKind::Deployment => ResourceKind::Deployment,
            CandidateKind::StatefulSet => ResourceKind::StatefulSet,
            CandidateKind::DaemonSet => ResourceKind::DaemonSet,
            CandidateKind::ReplicaSet => ResourceKind::ReplicaSet,
            CandidateKind::Job => ResourceKind::Job,
            CandidateKind::CronJob => ResourceKind::CronJob,
            CandidateKind::Ingress => ResourceKind::Ingress,
            CandidateKind::ServiceAccount => ResourceKind::ServiceAccount,
            CandidateKind::Service => ResourceKind::Service,
            CandidateKind::ValidatingWebhookConfiguration => {
                ResourceKind::ValidatingWebhookConfiguration
            }
            CandidateKind::MutatingWebhookConfiguration => {
                ResourceKind::MutatingWebhookConfiguration
            }
            CandidateKind::ApiService => ResourceKind::ApiService,
            CandidateKind::CustomResourceDefinition => ResourceKind::CustomResourceDefinition,
        }
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CandidateKind {
    type Err = UnsupportedKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| UnsupportedKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.label().parse::<ResourceKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_parsing_is_case_sensitive() {
        assert!("secret".parse::<ResourceKind>().is_err());
        assert!("configmap".parse::<TargetKind>().is_err());
        assert_eq!(
            "APIService".parse::<CandidateKind>().unwrap(),
            CandidateKind::ApiService
        );
    }

    #[test]
    fn test_monitored_kinds_exclude_lookup_only_targets() {
        assert_eq!(
            TargetKind::parse_monitored("Secret").unwrap(),
            TargetKind::Secret
        );
        assert_eq!(
            TargetKind::parse_monitored("Service"),
            Err(UnsupportedKind("Service".to_string()))
        );
        assert!(TargetKind::parse_monitored("Deployment").is_err());
    }

    #[test]
    fn test_cluster_scoped_kinds() {
        assert!(!CandidateKind::ApiService.is_namespaced());
        assert!(!CandidateKind::CustomResourceDefinition.is_namespaced());
        assert!(CandidateKind::Ingress.is_namespaced());
        assert!(ResourceKind::Secret.is_namespaced());
    }
}
