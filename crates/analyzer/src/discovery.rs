//! Reference discovery engine

use orphanage_cluster::{CandidateKind, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::registry::MatcherRegistry;
use crate::target::Target;

/// Finds every candidate referencing a target, across all matchers
#[derive(Debug, Clone)]
pub struct ReferenceDiscovery {
    registry: Arc<MatcherRegistry>,
}

impl ReferenceDiscovery {
    pub fn new(registry: Arc<MatcherRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MatcherRegistry {
        &self.registry
    }

    /// Union of the references found by every matcher able to reference
    /// `target`'s kind.
    ///
    /// The first matcher failure fails the whole lookup. A partial union is
    /// never returned, since it could make a referenced target look orphaned.
    pub async fn find_references(
        &self,
        reader: &ClusterReader,
        target: &Target,
    ) -> Result<BTreeSet<ObjectRef>> {
        let mut found = BTreeSet::new();

        for matcher in self.registry.capable_of(target.kind).collect::<Vec<_>>() {
            let references = matcher.find_references(reader, target).await?;
            if !references.is_empty() {
                debug!(
                    target = %target,
                    candidate = %matcher.kind(),
                    count = references.len(),
                    "found references"
                );
            }
            found.extend(references);
        }

        Ok(found)
    }

    /// Lookup for a target named by kind label, e.g. `("Secret", "default", "creds")`
    pub async fn find_references_by_label(
        &self,
        reader: &ClusterReader,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeSet<ObjectRef>> {
        let kind: TargetKind = kind.parse()?;
        self.find_references(reader, &Target::new(kind, namespace, name))
            .await
    }

    /// References to `target` from one candidate kind only
    pub async fn find_references_in_kind(
        &self,
        reader: &ClusterReader,
        candidate: CandidateKind,
        target: &Target,
    ) -> Result<BTreeSet<ObjectRef>> {
        self.registry
            .resolve(candidate)?
            .find_references(reader, target)
            .await
    }
}

impl Default for ReferenceDiscovery {
    fn default() -> Self {
        Self::new(Arc::new(MatcherRegistry::new()))
    }
}
