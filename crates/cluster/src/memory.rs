//! In-memory cluster state

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::ClusterError;
use crate::kinds::ResourceKind;
use crate::object::{ClusterObject, ObjectRef};
use crate::state::{ClusterState, Scope};

/// Cluster state held in memory.
///
/// Backs offline scans of manifest directories and tests. Reads of a kind can
/// be made to fail to simulate a transient API server error.
#[derive(Default)]
pub struct InMemoryCluster {
    /// Stored objects, keyed by identity
    objects: RwLock<BTreeMap<ObjectRef, ClusterObject>>,

    /// Kinds whose reads currently fail
    failing: RwLock<HashSet<ResourceKind>>,

    /// Number of list and get calls served
    calls: AtomicUsize,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: impl IntoIterator<Item = ClusterObject>) -> Self {
        let objects = objects
            .into_iter()
            .map(|object| (object.object_ref(), object))
            .collect();

        Self {
            objects: RwLock::new(objects),
            ..Self::default()
        }
    }

    /// Create or replace an object
    pub async fn apply(&self, object: ClusterObject) {
        self.objects
            .write()
            .await
            .insert(object.object_ref(), object);
    }

    /// Remove an object, returning whether it existed
    pub async fn delete(&self, object: &ObjectRef) -> bool {
        self.objects.write().await.remove(object).is_some()
    }

    /// Make every read of `kind` fail until [`InMemoryCluster::heal`] is called
    pub async fn fail_reads(&self, kind: ResourceKind) {
        self.failing.write().await.insert(kind);
    }

    pub async fn heal(&self, kind: ResourceKind) {
        self.failing.write().await.remove(&kind);
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ClusterState for InMemoryCluster {
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Vec<ClusterObject>, ClusterError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.read().await.contains(&kind) {
            return Err(ClusterError::list(
                kind,
                scope.namespace(),
                "injected read failure",
            ));
        }

        let objects = self.objects.read().await;
        Ok(objects
            .values()
            .filter(|object| object.kind() == kind)
            .filter(|object| match scope {
                Scope::Namespace(namespace) if kind.is_namespaced() => {
                    object.namespace() == Some(namespace.as_str())
                }
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ClusterObject>, ClusterError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.read().await.contains(&kind) {
            return Err(ClusterError::get(kind, namespace, "injected read failure"));
        }

        let key = ObjectRef {
            kind,
            namespace: if kind.is_namespaced() {
                namespace.map(str::to_string)
            } else {
                None
            },
            name: name.to_string(),
        };
        Ok(self.objects.read().await.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Cancellation;
    use crate::reader::ClusterReader;
    use k8s_openapi::api::core::v1::Secret;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::sync::Arc;

    fn secret(namespace: &str, name: &str) -> ClusterObject {
        ClusterObject::Secret(Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_list_filters_by_namespace() {
        let cluster = InMemoryCluster::from_objects([
            secret("a", "one"),
            secret("a", "two"),
            secret("b", "three"),
        ]);

        let in_a = cluster
            .list(ResourceKind::Secret, &Scope::Namespace("a".to_string()))
            .await
            .unwrap();
        assert_eq!(in_a.len(), 2);

        let everywhere = cluster.list(ResourceKind::Secret, &Scope::Cluster).await.unwrap();
        assert_eq!(everywhere.len(), 3);

        let configmaps = cluster.list(ResourceKind::ConfigMap, &Scope::Cluster).await.unwrap();
        assert!(configmaps.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures_and_heal() {
        let cluster = InMemoryCluster::from_objects([secret("a", "one")]);
        cluster.fail_reads(ResourceKind::Secret).await;

        let result = cluster.list(ResourceKind::Secret, &Scope::Cluster).await;
        assert!(matches!(result, Err(ClusterError::Request { .. })));

        cluster.heal(ResourceKind::Secret).await;
        assert!(cluster
            .get(ResourceKind::Secret, Some("a"), "one")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_apply_replaces_and_delete_removes() {
        let cluster = InMemoryCluster::new();
        cluster.apply(secret("a", "one")).await;
        cluster.apply(secret("a", "one")).await;
        assert_eq!(cluster.len().await, 1);

        let removed = cluster
            .delete(&ObjectRef::namespaced(ResourceKind::Secret, "a", "one"))
            .await;
        assert!(removed);
        assert!(cluster.is_empty().await);
    }

    #[tokio::test]
    async fn test_reader_memoizes_lists_within_a_pass() {
        let cluster = Arc::new(InMemoryCluster::from_objects([secret("a", "one")]));
        let reader = ClusterReader::new(cluster.clone(), Cancellation::none());
        let scope = Scope::Namespace("a".to_string());

        for _ in 0..3 {
            let objects = reader.list(ResourceKind::Secret, &scope).await.unwrap();
            assert_eq!(objects.len(), 1);
        }

        assert_eq!(reader.upstream_reads(), 1);
        assert_eq!(cluster.calls(), 1);
    }

    #[tokio::test]
    async fn test_reader_does_not_memoize_failures() {
        let cluster = Arc::new(InMemoryCluster::from_objects([secret("a", "one")]));
        let reader = ClusterReader::new(cluster.clone(), Cancellation::none());

        cluster.fail_reads(ResourceKind::Secret).await;
        assert!(reader.list(ResourceKind::Secret, &Scope::Cluster).await.is_err());

        cluster.heal(ResourceKind::Secret).await;
        assert_eq!(
            reader
                .list(ResourceKind::Secret, &Scope::Cluster)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
