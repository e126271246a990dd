//! Per-pass cluster reader

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cancel::Cancellation;
use crate::error::ClusterError;
use crate::kinds::ResourceKind;
use crate::object::ClusterObject;
use crate::state::{ClusterState, Scope};

/// Reads cluster state on behalf of one evaluation pass.
///
/// Every read is guarded by the pass's cancellation. List results are
/// memoized for the lifetime of the reader, so a reader must not outlive the
/// pass it was created for. Failed reads are never memoized.
pub struct ClusterReader {
    state: Arc<dyn ClusterState>,
    cancel: Cancellation,
    lists: Mutex<HashMap<(ResourceKind, Scope), Arc<Vec<ClusterObject>>>>,
    upstream_reads: AtomicUsize,
}

impl ClusterReader {
    pub fn new(state: Arc<dyn ClusterState>, cancel: Cancellation) -> Self {
        Self {
            state,
            cancel,
            lists: Mutex::new(HashMap::new()),
            upstream_reads: AtomicUsize::new(0),
        }
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    /// List objects of `kind` in `scope`
    pub async fn list(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Arc<Vec<ClusterObject>>, ClusterError> {
        let key = (kind, scope.clone());
        if let Some(objects) = self.lists.lock().await.get(&key) {
            return Ok(Arc::clone(objects));
        }

        debug!(%kind, %scope, "listing from cluster state");
        self.upstream_reads.fetch_add(1, Ordering::Relaxed);
        let objects = Arc::new(self.cancel.guard(self.state.list(kind, scope)).await?);

        self.lists.lock().await.insert(key, Arc::clone(&objects));
        Ok(objects)
    }

    /// Fetch one object; gets are not memoized
    pub async fn get(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ClusterObject>, ClusterError> {
        debug!(%kind, ?namespace, name, "getting from cluster state");
        self.upstream_reads.fetch_add(1, Ordering::Relaxed);
        self.cancel
            .guard(self.state.get(kind, namespace, name))
            .await
    }

    /// Number of reads that reached the underlying cluster state
    pub fn upstream_reads(&self) -> usize {
        self.upstream_reads.load(Ordering::Relaxed)
    }
}
