//! Typed cluster objects and references to them

use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::kube_aggregator::pkg::apis::apiregistration::v1::APIService;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::kinds::ResourceKind;

/// Identity of an object in the cluster
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object kind
    pub kind: ResourceKind,

    /// Namespace, `None` for cluster-scoped objects
    pub namespace: Option<String>,

    /// Object name
    pub name: String,
}

impl ObjectRef {
    pub fn namespaced(
        kind: ResourceKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster_scoped(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{} {}/{}", self.kind, namespace, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// An object read from cluster state, tagged by kind
#[derive(Debug, Clone)]
pub enum ClusterObject {
    Secret(Secret),
    ConfigMap(ConfigMap),
    Service(Service),
    Pod(Pod),
    Deployment(Deployment),
    StatefulSet(StatefulSet),
    DaemonSet(DaemonSet),
    ReplicaSet(ReplicaSet),
    Job(Job),
    CronJob(CronJob),
    Ingress(Ingress),
    ServiceAccount(ServiceAccount),
    ValidatingWebhookConfiguration(ValidatingWebhookConfiguration),
    MutatingWebhookConfiguration(MutatingWebhookConfiguration),
    ApiService(APIService),
    CustomResourceDefinition(CustomResourceDefinition),
}

impl ClusterObject {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ClusterObject::Secret(_) => ResourceKind::Secret,
            ClusterObject::ConfigMap(_) => ResourceKind::ConfigMap,
            ClusterObject::Service(_) => ResourceKind::Service,
            ClusterObject::Pod(_) => ResourceKind::Pod,
            ClusterObject::Deployment(_) => ResourceKind::Deployment,
            ClusterObject::StatefulSet(_) => ResourceKind::StatefulSet,
            ClusterObject::DaemonSet(_) => ResourceKind::DaemonSet,
            ClusterObject::ReplicaSet(_) => ResourceKind::ReplicaSet,
            ClusterObject::Job(_) => ResourceKind::Job,
            ClusterObject::CronJob(_) => ResourceKind::CronJob,
            ClusterObject::Ingress(_) => ResourceKind::Ingress,
            ClusterObject::ServiceAccount(_) => ResourceKind::ServiceAccount,
            ClusterObject::ValidatingWebhookConfiguration(_) => {
                ResourceKind::ValidatingWebhookConfiguration
            }
            ClusterObject::MutatingWebhookConfiguration(_) => {
                ResourceKind::MutatingWebhookConfiguration
            }
            ClusterObject::ApiService(_) => ResourceKind::ApiService,
            ClusterObject::CustomResourceDefinition(_) => ResourceKind::CustomResourceDefinition,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ClusterObject::Secret(o) => &o.metadata,
            ClusterObject::ConfigMap(o) => &o.metadata,
            ClusterObject::Service(o) => &o.metadata,
            ClusterObject::Pod(o) => &o.metadata,
            ClusterObject::Deployment(o) => &o.metadata,
            ClusterObject::StatefulSet(o) => &o.metadata,
            ClusterObject::DaemonSet(o) => &o.metadata,
            ClusterObject::ReplicaSet(o) => &o.metadata,
            ClusterObject::Job(o) => &o.metadata,
            ClusterObject::CronJob(o) => &o.metadata,
            ClusterObject::Ingress(o) => &o.metadata,
            ClusterObject::ServiceAccount(o) => &o.metadata,
            ClusterObject::ValidatingWebhookConfiguration(o) => &o.metadata,
            ClusterObject::MutatingWebhookConfiguration(o) => &o.metadata,
            ClusterObject::ApiService(o) => &o.metadata,
            ClusterObject::CustomResourceDefinition(o) => &o.metadata,
        }
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        match self {
            ClusterObject::Secret(o) => &mut o.metadata,
            ClusterObject::ConfigMap(o) => &mut o.metadata,
            ClusterObject::Service(o) => &mut o.metadata,
            ClusterObject::Pod(o) => &mut o.metadata,
            ClusterObject::Deployment(o) => &mut o.metadata,
            ClusterObject::StatefulSet(o) => &mut o.metadata,
            ClusterObject::DaemonSet(o) => &mut o.metadata,
            ClusterObject::ReplicaSet(o) => &mut o.metadata,
            ClusterObject::Job(o) => &mut o.metadata,
            ClusterObject::CronJob(o) => &mut o.metadata,
            ClusterObject::Ingress(o) => &mut o.metadata,
            ClusterObject::ServiceAccount(o) => &mut o.metadata,
            ClusterObject::ValidatingWebhookConfiguration(o) => &mut o.metadata,
            ClusterObject::MutatingWebhookConfiguration(o) => &mut o.metadata,
            ClusterObject::ApiService(o) => &mut o.metadata,
            ClusterObject::CustomResourceDefinition(o) => &mut o.metadata,
        }
    }

    /// Place a namespaced object that declares no namespace into `namespace`,
    /// the way `kubectl apply -n` would
    pub fn default_namespace(&mut self, namespace: &str) {
        if !self.kind().is_namespaced() {
            return;
        }
        let metadata = self.metadata_mut();
        if metadata.namespace.as_deref().map_or(true, str::is_empty) {
            metadata.namespace = Some(namespace.to_string());
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        if self.kind().is_namespaced() {
            self.metadata().namespace.as_deref()
        } else {
            None
        }
    }

    /// Object labels, empty when none are set
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.metadata().labels.clone().unwrap_or_default()
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            kind: self.kind(),
            namespace: self.namespace().map(str::to_string),
            name: self.name().to_string(),
        }
    }

    /// Deserialize a manifest document into a typed object.
    ///
    /// Returns `Ok(None)` for documents whose kind is not read by the auditor.
    pub fn from_manifest(document: serde_yaml::Value) -> Result<Option<Self>, serde_yaml::Error> {
        let Some(kind) = document
            .get("kind")
            .and_then(|k| k.as_str())
            .and_then(|k| k.parse::<ResourceKind>().ok())
        else {
            return Ok(None);
        };

        let object = match kind {
            ResourceKind::Secret => ClusterObject::Secret(serde_yaml::from_value(document)?),
            ResourceKind::ConfigMap => ClusterObject::ConfigMap(serde_yaml::from_value(document)?),
            ResourceKind::Service => ClusterObject::Service(serde_yaml::from_value(document)?),
            ResourceKind::Pod => ClusterObject::Pod(serde_yaml::from_value(document)?),
            ResourceKind::Deployment => {
                ClusterObject::Deployment(serde_yaml::from_value(document)?)
            }
            ResourceKind::StatefulSet => {
                ClusterObject::StatefulSet(serde_yaml::from_value(document)?)
            }
            ResourceKind::DaemonSet => ClusterObject::DaemonSet(serde_yaml::from_value(document)?),
            ResourceKind::ReplicaSet => {
                ClusterObject::ReplicaSet(serde_yaml::from_value(document)?)
            }
            ResourceKind::Job => ClusterObject::Job(serde_yaml::from_value(document)?),
            ResourceKind::CronJob => ClusterObject::CronJob(serde_yaml::from_value(document)?),
            ResourceKind::Ingress => ClusterObject::Ingress(serde_yaml::from_value(document)?),
            ResourceKind::ServiceAccount => {
                ClusterObject::ServiceAccount(serde_yaml::from_value(document)?)
            }
            ResourceKind::ValidatingWebhookConfiguration => {
                ClusterObject::ValidatingWebhookConfiguration(serde_yaml::from_value(document)?)
            }
            ResourceKind::MutatingWebhookConfiguration => {
                ClusterObject::MutatingWebhookConfiguration(serde_yaml::from_value(document)?)
            }
            ResourceKind::ApiService => {
                ClusterObject::ApiService(serde_yaml::from_value(document)?)
            }
            ResourceKind::CustomResourceDefinition => {
                ClusterObject::CustomResourceDefinition(serde_yaml::from_value(document)?)
            }
        };

        Ok(Some(object))
    }
}
