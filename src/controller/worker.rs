//! Per-policy reconciliation worker

use anyhow::Result;
use orphanage_analyzer::{AnalyzerError, OrphanAggregator};
use orphanage_cluster::{Cancellation, ClusterReader, ClusterState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

use super::backoff::Backoff;
use super::source::PolicySource;
use crate::config::BackoffConfig;
use crate::policy::{OrphanagePolicyStatus, PolicyKey};
use crate::status::StatusPublisher;

/// What one pass did
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The report was published as this status
    Published(OrphanagePolicyStatus),

    /// The policy no longer exists
    PolicyGone,
}

/// Everything a pass needs, shared by all workers
pub struct Reconciler {
    pub(crate) state: Arc<dyn ClusterState>,
    pub(crate) policies: Arc<dyn PolicySource>,
    pub(crate) publisher: Arc<dyn StatusPublisher>,
    pub(crate) aggregator: OrphanAggregator,
    pub(crate) evaluation_timeout: Duration,
    pub(crate) backoff: BackoffConfig,
}

impl Reconciler {
    /// Evaluate one policy's namespace and publish the result.
    ///
    /// Reads go through a fresh per-pass reader that observes `shutdown` and
    /// the evaluation deadline. Nothing is published unless the evaluation
    /// succeeds end to end.
    pub async fn reconcile(
        &self,
        key: &PolicyKey,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<PassOutcome> {
        let Some(policy) = self.policies.get(key).await? else {
            return Ok(PassOutcome::PolicyGone);
        };
        let kinds = policy.monitored_kinds().map_err(AnalyzerError::from)?;

        let cancel =
            Cancellation::from_signal(shutdown.clone()).with_timeout(self.evaluation_timeout);
        let reader = ClusterReader::new(Arc::clone(&self.state), cancel);

        let report = self
            .aggregator
            .evaluate(&reader, &key.namespace, &kinds)
            .await?;
        let status = self.publisher.publish(&policy, &report).await?;

        Ok(PassOutcome::Published(status))
    }
}

/// Errors that retrying cannot fix
pub(crate) fn is_fatal(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<AnalyzerError>()
        .is_some_and(AnalyzerError::is_fatal)
}

/// Reads aborted by shutdown or the evaluation deadline
pub(crate) fn is_cancellation(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<AnalyzerError>()
        .is_some_and(AnalyzerError::is_cancellation)
}

/// Drive reconciliation of one policy until shutdown.
///
/// Waits on `trigger`; notifications that arrive while a pass is running
/// collapse into a single follow-up pass. Failed passes are retried with
/// backoff, except configuration errors, which wait for the next trigger.
pub(crate) async fn run_worker(
    key: PolicyKey,
    reconciler: Arc<Reconciler>,
    trigger: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = Backoff::new(&reconciler.backoff);
    debug!(policy = %key, "worker started");

    'worker: loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = trigger.notified() => {}
            changed = shutdown.changed() => {
                // a dropped sender counts as shutdown
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        loop {
            if *shutdown.borrow() {
                break 'worker;
            }

            match reconciler.reconcile(&key, &shutdown).await {
                Ok(PassOutcome::Published(status)) => {
                    backoff.reset();
                    info!(policy = %key, orphans = status.orphan_count, "status published");
                    break;
                }
                Ok(PassOutcome::PolicyGone) => {
                    backoff.reset();
                    debug!(policy = %key, "policy no longer exists");
                    break;
                }
                Err(e) if is_fatal(&e) => {
                    backoff.reset();
                    error!(policy = %key, "Invalid policy, not retrying: {e:#}");
                    break;
                }
                Err(e) => {
                    if *shutdown.borrow() {
                        if is_cancellation(&e) {
                            debug!(policy = %key, "pass cancelled by shutdown");
                        }
                        break 'worker;
                    }
                    let delay = backoff.next_delay();
                    warn!(
                        policy = %key,
                        attempt = backoff.attempts(),
                        "Evaluation failed, retrying in {delay:?}: {e:#}"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break 'worker;
                            }
                        }
                    }
                }
            }
        }
    }

    debug!(policy = %key, "worker stopped");
}
