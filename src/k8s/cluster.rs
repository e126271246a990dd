//! Cluster state read through the Kubernetes API

use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::kube_aggregator::pkg::apis::apiregistration::v1::APIService;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::api::{Api, ListParams};
use kube::{Client, Resource};
use orphanage_cluster::{ClusterError, ClusterObject, ClusterState, ResourceKind, Scope};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// [`ClusterState`] backed by the API server
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn list_namespaced<K>(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Vec<K>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let api: Api<K> = match scope {
            Scope::Namespace(namespace) => Api::namespaced(self.client.clone(), namespace),
            Scope::Cluster => Api::all(self.client.clone()),
        };

        api.list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| ClusterError::list(kind, scope.namespace(), e.to_string()))
    }

    async fn list_cluster<K>(&self, kind: ResourceKind) -> Result<Vec<K>, ClusterError>
    where
        K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        Api::<K>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| ClusterError::list(kind, None, e.to_string()))
    }

    async fn get_namespaced<K>(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<K>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let Some(namespace) = namespace else {
            return Err(ClusterError::get(kind, None, "a namespace is required"));
        };

        Api::<K>::namespaced(self.client.clone(), namespace)
            .get_opt(name)
            .await
            .map_err(|e| ClusterError::get(kind, Some(namespace), e.to_string()))
    }

    async fn get_cluster<K>(
        &self,
        kind: ResourceKind,
        name: &str,
    ) -> Result<Option<K>, ClusterError>
    where
        K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        Api::<K>::all(self.client.clone())
            .get_opt(name)
            .await
            .map_err(|e| ClusterError::get(kind, None, e.to_string()))
    }
}

fn wrap<K>(items: Vec<K>, variant: fn(K) -> ClusterObject) -> Vec<ClusterObject> {
    items.into_iter().map(variant).collect()
}

#[async_trait]
impl ClusterState for KubeCluster {
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Vec<ClusterObject>, ClusterError> {
        let objects = match kind {
            ResourceKind::Secret => wrap(
                self.list_namespaced::<Secret>(kind, scope).await?,
                ClusterObject::Secret,
            ),
            ResourceKind::ConfigMap => wrap(
                self.list_namespaced::<ConfigMap>(kind, scope).await?,
                ClusterObject::ConfigMap,
            ),
            ResourceKind::Service => wrap(
                self.list_namespaced::<Service>(kind, scope).await?,
                ClusterObject::Service,
            ),
            ResourceKind::Pod => wrap(
                self.list_namespaced::<Pod>(kind, scope).await?,
                ClusterObject::Pod,
            ),
            ResourceKind::Deployment => wrap(
                self.list_namespaced::<Deployment>(kind, scope).await?,
                ClusterObject::Deployment,
            ),
            ResourceKind::StatefulSet => wrap(
                self.list_namespaced::<StatefulSet>(kind, scope).await?,
                ClusterObject::StatefulSet,
            ),
            ResourceKind::DaemonSet => wrap(
                self.list_namespaced::<DaemonSet>(kind, scope).await?,
                ClusterObject::DaemonSet,
            ),
            ResourceKind::ReplicaSet => wrap(
                self.list_namespaced::<ReplicaSet>(kind, scope).await?,
                ClusterObject::ReplicaSet,
            ),
            ResourceKind::Job => wrap(
                self.list_namespaced::<Job>(kind, scope).await?,
                ClusterObject::Job,
            ),
            ResourceKind::CronJob => wrap(
                self.list_namespaced::<CronJob>(kind, scope).await?,
                ClusterObject::CronJob,
            ),
            ResourceKind::Ingress => wrap(
                self.list_namespaced::<Ingress>(kind, scope).await?,
                ClusterObject::Ingress,
            ),
            ResourceKind::ServiceAccount => wrap(
                self.list_namespaced::<ServiceAccount>(kind, scope).await?,
                ClusterObject::ServiceAccount,
            ),
            ResourceKind::ValidatingWebhookConfiguration => wrap(
                self.list_cluster::<ValidatingWebhookConfiguration>(kind).await?,
                ClusterObject::ValidatingWebhookConfiguration,
            ),
            ResourceKind::MutatingWebhookConfiguration => wrap(
                self.list_cluster::<MutatingWebhookConfiguration>(kind).await?,
                ClusterObject::MutatingWebhookConfiguration,
            ),
            ResourceKind::ApiService => wrap(
                self.list_cluster::<APIService>(kind).await?,
                ClusterObject::ApiService,
            ),
            ResourceKind::CustomResourceDefinition => wrap(
                self.list_cluster::<CustomResourceDefinition>(kind).await?,
                ClusterObject::CustomResourceDefinition,
            ),
        };

        Ok(objects)
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ClusterObject>, ClusterError> {
        let object = match kind {
            ResourceKind::Secret => self
                .get_namespaced::<Secret>(kind, namespace, name)
                .await?
                .map(ClusterObject::Secret),
            ResourceKind::ConfigMap => self
                .get_namespaced::<ConfigMap>(kind, namespace, name)
                .await?
                .map(ClusterObject::ConfigMap),
            ResourceKind::Service => self
                .get_namespaced::<Service>(kind, namespace, name)
                .await?
                .map(ClusterObject::Service),
            ResourceKind::Pod => self
                .get_namespaced::<Pod>(kind, namespace, name)
                .await?
                .map(ClusterObject::Pod),
            ResourceKind::Deployment => self
                .get_namespaced::<Deployment>(kind, namespace, name)
                .await?
                .map(ClusterObject::Deployment),
            ResourceKind::StatefulSet => self
                .get_namespaced::<StatefulSet>(kind, namespace, name)
                .await?
                .map(ClusterObject::StatefulSet),
            ResourceKind::DaemonSet => self
                .get_namespaced::<DaemonSet>(kind, namespace, name)
                .await?
                .map(ClusterObject::DaemonSet),
            ResourceKind::ReplicaSet => self
                .get_namespaced::<ReplicaSet>(kind, namespace, name)
                .await?
                .map(ClusterObject::ReplicaSet),
            ResourceKind::Job => self
                .get_namespaced::<Job>(kind, namespace, name)
                .await?
                .map(ClusterObject::Job),
            ResourceKind::CronJob => self
                .get_namespaced::<CronJob>(kind, namespace, name)
                .await?
                .map(ClusterObject::CronJob),
            ResourceKind::Ingress => self
                .get_namespaced::<Ingress>(kind, namespace, name)
                .await?
                .map(ClusterObject::Ingress),
            ResourceKind::ServiceAccount => self
                .get_namespaced::<ServiceAccount>(kind, namespace, name)
                .await?
                .map(ClusterObject::ServiceAccount),
            ResourceKind::ValidatingWebhookConfiguration => self
                .get_cluster::<ValidatingWebhookConfiguration>(kind, name)
                .await?
                .map(ClusterObject::ValidatingWebhookConfiguration),
            ResourceKind::MutatingWebhookConfiguration => self
                .get_cluster::<MutatingWebhookConfiguration>(kind, name)
                .await?
                .map(ClusterObject::MutatingWebhookConfiguration),
            ResourceKind::ApiService => self
                .get_cluster::<APIService>(kind, name)
                .await?
                .map(ClusterObject::ApiService),
            ResourceKind::CustomResourceDefinition => self
                .get_cluster::<CustomResourceDefinition>(kind, name)
                .await?
                .map(ClusterObject::CustomResourceDefinition),
        };

        Ok(object)
    }
}
