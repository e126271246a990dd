//! Reconciliation control loop
//!
//! Cluster events are fanned out to one worker per policy. A worker is idle
//! until triggered, then evaluates its policy's namespace and publishes the
//! result. Triggers that arrive mid-pass coalesce into one follow-up pass.

pub mod backoff;
pub mod events;
pub mod source;
pub mod worker;

pub use backoff::Backoff;
pub use events::ClusterEvent;
pub use source::{InMemoryPolicies, PolicySource};
pub use worker::{PassOutcome, Reconciler};

use anyhow::Result;
use orphanage_analyzer::OrphanAggregator;
use orphanage_cluster::ClusterState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ControllerConfig;
use crate::policy::PolicyKey;
use crate::status::StatusPublisher;

struct Worker {
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
}

/// Routes cluster events to per-policy workers
pub struct Controller {
    reconciler: Arc<Reconciler>,
    workers: HashMap<PolicyKey, Worker>,
}

impl Controller {
    pub fn new(
        state: Arc<dyn ClusterState>,
        policies: Arc<dyn PolicySource>,
        publisher: Arc<dyn StatusPublisher>,
        config: &ControllerConfig,
    ) -> Self {
        Self::with_aggregator(state, policies, publisher, config, OrphanAggregator::default())
    }

    pub fn with_aggregator(
        state: Arc<dyn ClusterState>,
        policies: Arc<dyn PolicySource>,
        publisher: Arc<dyn StatusPublisher>,
        config: &ControllerConfig,
        aggregator: OrphanAggregator,
    ) -> Self {
        Self {
            reconciler: Arc::new(Reconciler {
                state,
                policies,
                publisher,
                aggregator,
                evaluation_timeout: config.evaluation_timeout(),
                backoff: config.backoff.clone(),
            }),
            workers: HashMap::new(),
        }
    }

    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Process events until `shutdown` is set or the event stream ends.
    ///
    /// Every existing policy is evaluated once at startup.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ClusterEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("Starting controller");

        let Some(existing) = self.list_policies(&mut shutdown).await else {
            info!("Controller stopped before startup completed");
            return Ok(());
        };
        for key in existing {
            self.trigger(key, &shutdown);
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                event = events.recv() => match event {
                    Some(event) => self.handle(event, &shutdown),
                    None => {
                        info!("Event stream closed");
                        break;
                    }
                },
            }
        }

        let signalled = *shutdown.borrow();
        self.stop(signalled).await;
        info!("Controller stopped");
        Ok(())
    }

    /// Every existing policy, retrying failed listings with backoff.
    ///
    /// `None` when shutdown is requested first.
    async fn list_policies(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<Vec<PolicyKey>> {
        let mut backoff = Backoff::new(&self.reconciler.backoff);

        loop {
            if *shutdown.borrow() {
                return None;
            }

            match self.reconciler.policies.list().await {
                Ok(keys) => return Some(keys),
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        attempt = backoff.attempts(),
                        "Failed to list policies, retrying in {delay:?}: {e:#}"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                return None;
                            }
                        }
                    }
                }
            }
        }
    }

    fn handle(&mut self, event: ClusterEvent, shutdown: &watch::Receiver<bool>) {
        debug!(%event, "received event");

        match event {
            ClusterEvent::Policy { key, deleted: true } => {
                if let Some(worker) = self.workers.remove(&key) {
                    info!(policy = %key, "Policy deleted, stopping worker");
                    worker.task.abort();
                }
            }
            ClusterEvent::Policy { key, deleted: false } => self.trigger(key, shutdown),
            ClusterEvent::Resource { .. } => {
                for worker in self.workers.values() {
                    worker.trigger.notify_one();
                }
            }
        }
    }

    /// Trigger a pass for `key`, starting its worker if needed
    fn trigger(&mut self, key: PolicyKey, shutdown: &watch::Receiver<bool>) {
        let worker = self.workers.entry(key.clone()).or_insert_with(|| {
            info!(policy = %key, "Starting worker");
            let trigger = Arc::new(Notify::new());
            let task = tokio::spawn(worker::run_worker(
                key,
                Arc::clone(&self.reconciler),
                Arc::clone(&trigger),
                shutdown.clone(),
            ));
            Worker { trigger, task }
        });
        worker.trigger.notify_one();
    }

    /// Wait for workers to finish. Without a shutdown signal they would
    /// never return, so they are aborted instead.
    async fn stop(&mut self, signalled: bool) {
        for (key, worker) in self.workers.drain() {
            if !signalled {
                worker.task.abort();
            }
            if let Err(e) = worker.task.await {
                if !e.is_cancelled() {
                    warn!(policy = %key, "Worker failed: {e}");
                }
            }
        }
    }

    /// Policies that currently have a worker
    pub fn policies(&self) -> Vec<PolicyKey> {
        let mut keys: Vec<_> = self.workers.keys().cloned().collect();
        keys.sort();
        keys
    }
}
