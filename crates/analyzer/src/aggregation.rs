//! Orphan aggregation engine

use orphanage_cluster::{ClusterReader, Scope, TargetKind, UnsupportedKind};
use std::time::Instant;
use tracing::{debug, info};

use crate::discovery::ReferenceDiscovery;
use crate::error::Result;
use crate::report::{Orphan, OrphanReport};
use crate::target::Target;

/// Evaluates a namespace for targets nothing references
#[derive(Debug, Clone, Default)]
pub struct OrphanAggregator {
    discovery: ReferenceDiscovery,
}

impl OrphanAggregator {
    pub fn new(discovery: ReferenceDiscovery) -> Self {
        Self { discovery }
    }

    pub fn discovery(&self) -> &ReferenceDiscovery {
        &self.discovery
    }

    /// Evaluate `namespace` for orphans of each `monitored` kind.
    ///
    /// Every target of every monitored kind is checked against all matchers.
    /// The first failure aborts the evaluation; no report is produced from
    /// incomplete reads.
    pub async fn evaluate(
        &self,
        reader: &ClusterReader,
        namespace: &str,
        monitored: &[TargetKind],
    ) -> Result<OrphanReport> {
        let started = Instant::now();
        let kinds = monitored_kinds(monitored)?;
        let scope = Scope::Namespace(namespace.to_string());

        let mut orphans = Vec::new();
        let mut targets_evaluated = 0;

        for kind in kinds {
            let objects = reader.list(kind.into(), &scope).await?;
            let mut names: Vec<&str> = objects.iter().map(|object| object.name()).collect();
            names.sort_unstable();
            names.dedup();

            for name in names {
                let target = Target::new(kind, namespace, name);
                let references = self.discovery.find_references(reader, &target).await?;
                targets_evaluated += 1;

                if references.is_empty() {
                    debug!(target = %target, "target is orphaned");
                    orphans.push(Orphan {
                        kind,
                        name: name.to_string(),
                    });
                }
            }
        }

        info!(
            namespace,
            targets = targets_evaluated,
            orphans = orphans.len(),
            reads = reader.upstream_reads(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "namespace evaluated"
        );

        Ok(OrphanReport::new(namespace, targets_evaluated, orphans))
    }

    /// Like [`OrphanAggregator::evaluate`], with monitored kinds given as labels
    pub async fn evaluate_labels<S: AsRef<str>>(
        &self,
        reader: &ClusterReader,
        namespace: &str,
        monitored: &[S],
    ) -> Result<OrphanReport> {
        let kinds = monitored
            .iter()
            .map(|label| TargetKind::parse_monitored(label.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.evaluate(reader, namespace, &kinds).await
    }
}

/// Deduplicate while keeping the caller's order, rejecting kinds that are
/// never orphan candidates
fn monitored_kinds(
    monitored: &[TargetKind],
) -> std::result::Result<Vec<TargetKind>, UnsupportedKind> {
    let mut kinds = Vec::with_capacity(monitored.len());
    for kind in monitored {
        if !kind.is_monitorable() {
            return Err(UnsupportedKind(kind.label().to_string()));
        }
        if !kinds.contains(kind) {
            kinds.push(*kind);
        }
    }
    Ok(kinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use orphanage_cluster::manifest::parse_documents;
    use orphanage_cluster::{Cancellation, InMemoryCluster, ResourceKind};
    use std::sync::Arc;

    const NAMESPACE: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: zeta
  namespace: apps
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: alpha
  namespace: apps
---
apiVersion: v1
kind: Secret
metadata:
  name: used
  namespace: apps
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
  namespace: apps
spec:
  selector:
    matchLabels:
      app: api
  template:
    metadata:
      labels:
        app: api
    spec:
      containers:
        - name: api
          image: api:1
          envFrom:
            - secretRef:
                name: used
"#;

    fn cluster() -> Arc<InMemoryCluster> {
        Arc::new(InMemoryCluster::from_objects(parse_documents(NAMESPACE).unwrap()))
    }

    #[tokio::test]
    async fn test_orphans_follow_kind_order_and_sort_by_name() {
        let cluster = cluster();
        let reader = ClusterReader::new(cluster, Cancellation::none());

        let report = OrphanAggregator::default()
            .evaluate(
                &reader,
                "apps",
                &[TargetKind::Secret, TargetKind::ConfigMap, TargetKind::Secret],
            )
            .await
            .unwrap();

        let names: Vec<_> = report.orphans.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["ConfigMap/alpha", "ConfigMap/zeta"]);
        assert_eq!(report.orphan_count, 2);
        assert_eq!(report.targets_evaluated, 3);
    }

    #[tokio::test]
    async fn test_reads_are_shared_within_a_pass() {
        let cluster = cluster();
        let reader = ClusterReader::new(cluster.clone(), Cancellation::none());

        OrphanAggregator::default()
            .evaluate(&reader, "apps", &[TargetKind::ConfigMap])
            .await
            .unwrap();

        // one ConfigMap list plus one list per pod-template kind
        assert_eq!(cluster.calls(), 8);
        assert_eq!(reader.upstream_reads(), 8);
    }

    #[tokio::test]
    async fn test_non_monitorable_kind_is_rejected() {
        let reader = ClusterReader::new(cluster(), Cancellation::none());

        let result = OrphanAggregator::default()
            .evaluate_labels(&reader, "apps", &["Secret", "Service"])
            .await;

        match result {
            Err(AnalyzerError::UnsupportedKind(kind)) => assert_eq!(kind.0, "Service"),
            other => panic!("expected unsupported kind, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_failure_aborts_evaluation() {
        let cluster = cluster();
        cluster.fail_reads(ResourceKind::Deployment).await;
        let reader = ClusterReader::new(cluster, Cancellation::none());

        let result = OrphanAggregator::default()
            .evaluate(&reader, "apps", &[TargetKind::Secret])
            .await;

        assert!(matches!(result, Err(AnalyzerError::ClusterRead(_))));
    }

    #[tokio::test]
    async fn test_signalled_shutdown_cancels_evaluation() {
        let (shutdown, signal) = tokio::sync::watch::channel(false);
        shutdown.send(true).unwrap();
        let cluster = cluster();
        let reader = ClusterReader::new(cluster.clone(), Cancellation::from_signal(signal));

        let error = OrphanAggregator::default()
            .evaluate(&reader, "apps", &TargetKind::MONITORABLE)
            .await
            .unwrap_err();

        assert!(matches!(error, AnalyzerError::ClusterRead(_)));
        assert!(error.is_cancellation());
        assert!(!error.is_fatal());
        assert_eq!(cluster.calls(), 0);
    }

    #[tokio::test]
    async fn test_expired_deadline_cancels_evaluation() {
        let cancel = Cancellation::none().with_deadline(tokio::time::Instant::now());
        let reader = ClusterReader::new(cluster(), cancel);

        let error = OrphanAggregator::default()
            .evaluate(&reader, "apps", &[TargetKind::Secret])
            .await
            .unwrap_err();

        assert!(error.is_cancellation());
    }

    #[tokio::test]
    async fn test_empty_namespace_has_no_orphans() {
        let reader = ClusterReader::new(cluster(), Cancellation::none());

        let report = OrphanAggregator::default()
            .evaluate(&reader, "empty", &TargetKind::MONITORABLE)
            .await
            .unwrap();

        assert_eq!(report.orphan_count, 0);
        assert_eq!(report.targets_evaluated, 0);
    }
}
