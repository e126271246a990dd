//! Orphanage
//!
//! Audits Kubernetes namespaces for Secrets and ConfigMaps that nothing
//! references, either once against manifests or a live cluster, or
//! continuously as a controller publishing results on `OrphanagePolicy`
//! objects.

pub mod cli;
pub mod config;
pub mod controller;
pub mod k8s;
pub mod policy;
pub mod status;

pub use config::{Config, ControllerConfig, OutputFormat, ScanConfig};
pub use controller::{ClusterEvent, Controller, InMemoryPolicies, PolicySource};
pub use policy::{OrphanagePolicy, OrphanagePolicySpec, OrphanagePolicyStatus, PolicyKey};
pub use status::{StatusPublisher, StatusWriteError};

use anyhow::{Context, Result};
use orphanage_analyzer::{OrphanAggregator, OrphanReport, Target};
use orphanage_cluster::{
    Cancellation, ClusterReader, ClusterState, InMemoryCluster, ManifestLoader, ObjectRef,
    TargetKind,
};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::k8s::{KubeCluster, KubePolicies};

/// Main application context that coordinates all components
pub struct Orphanage {
    config: Config,
    aggregator: OrphanAggregator,
}

impl Orphanage {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            aggregator: OrphanAggregator::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> &OrphanAggregator {
        &self.aggregator
    }

    /// Cluster state read from manifests under `dir`.
    ///
    /// Namespaced manifests that declare no namespace are placed in
    /// `namespace`.
    pub fn manifest_state(
        dir: &Path,
        filters: &[String],
        namespace: &str,
    ) -> Result<Arc<dyn ClusterState>> {
        let objects = ManifestLoader::with_filters(filters)?
            .with_default_namespace(namespace)
            .load_directory(dir)
            .with_context(|| format!("Failed to load manifests from {:?}", dir))?;
        Ok(Arc::new(InMemoryCluster::from_objects(objects)))
    }

    /// Cluster state read from the current kube context
    pub async fn live_state() -> Result<Arc<dyn ClusterState>> {
        let client = kube::Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        Ok(Arc::new(KubeCluster::new(client)))
    }

    fn reader(&self, state: Arc<dyn ClusterState>) -> ClusterReader {
        let cancel = Cancellation::none().with_timeout(self.config.controller.evaluation_timeout());
        ClusterReader::new(state, cancel)
    }

    /// Evaluate one namespace once
    pub async fn scan(
        &self,
        state: Arc<dyn ClusterState>,
        namespace: &str,
        kinds: &[TargetKind],
    ) -> Result<OrphanReport> {
        let reader = self.reader(state);
        let report = self
            .aggregator
            .evaluate(&reader, namespace, kinds)
            .await
            .with_context(|| format!("Failed to evaluate namespace {namespace}"))?;
        Ok(report)
    }

    /// Every candidate referencing `target`
    pub async fn references(
        &self,
        state: Arc<dyn ClusterState>,
        target: &Target,
    ) -> Result<BTreeSet<ObjectRef>> {
        let reader = self.reader(state);
        let references = self
            .aggregator
            .discovery()
            .find_references(&reader, target)
            .await
            .with_context(|| format!("Failed to find references to {target}"))?;
        Ok(references)
    }

    /// Run the controller against the current kube context until Ctrl-C
    pub async fn run_controller(&self) -> Result<()> {
        let client = kube::Client::try_default()
            .await
            .context("Failed to create Kubernetes client")?;
        let policies = Arc::new(KubePolicies::new(client.clone()));

        let controller = Controller::with_aggregator(
            Arc::new(KubeCluster::new(client.clone())),
            policies.clone(),
            policies,
            &self.config.controller,
            self.aggregator.clone(),
        );

        let (event_tx, event_rx) = mpsc::channel(self.config.controller.event_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let feed = k8s::spawn_event_feed(client, event_tx);

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {e}");
                // Dropping the sender would read as a shutdown request.
                std::future::pending::<()>().await;
            }
            info!("Shutdown requested");
            let _ = shutdown_tx.send(true);
        });

        let result = controller.run(event_rx, shutdown_rx).await;
        for task in feed {
            task.abort();
        }
        result
    }
}
