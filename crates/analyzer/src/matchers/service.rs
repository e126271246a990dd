//! Service matcher, resolving Pods through label selectors

use async_trait::async_trait;
use orphanage_cluster::{
    CandidateKind, ClusterObject, ClusterReader, ObjectRef, ResourceKind, Scope, TargetKind,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{ReferenceMatcher, Support};
use crate::error::{AnalyzerError, Result};
use crate::target::Target;

/// Services "reference" a Pod when their selector matches the Pod's labels.
///
/// The Pod is fetched first; a Pod that cannot be found is an error rather
/// than an empty result.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceMatcher;

impl ServiceMatcher {
    /// Whether a non-empty `selector` is a subset of `labels`
    pub fn selects(
        selector: &BTreeMap<String, String>,
        labels: &BTreeMap<String, String>,
    ) -> bool {
        !selector.is_empty()
            && selector
                .iter()
                .all(|(key, value)| labels.get(key) == Some(value))
    }

    fn selector(object: &ClusterObject) -> Option<&BTreeMap<String, String>> {
        match object {
            ClusterObject::Service(service) => service.spec.as_ref()?.selector.as_ref(),
            _ => None,
        }
    }
}

#[async_trait]
impl ReferenceMatcher for ServiceMatcher {
    fn kind(&self) -> CandidateKind {
        CandidateKind::Service
    }

    fn support(&self, target: TargetKind) -> Support {
        match target {
            TargetKind::Pod => Support::BySelector,
            TargetKind::Secret | TargetKind::ConfigMap | TargetKind::Service => Support::Never,
        }
    }

    async fn find_references(
        &self,
        reader: &ClusterReader,
        target: &Target,
    ) -> Result<BTreeSet<ObjectRef>> {
        if !self.support(target.kind).is_possible() {
            return Ok(BTreeSet::new());
        }

        let pod = reader
            .get(ResourceKind::Pod, Some(target.namespace.as_str()), &target.name)
            .await?
            .ok_or_else(|| AnalyzerError::TargetResolution {
                kind: target.kind,
                namespace: target.namespace.clone(),
                name: target.name.clone(),
                reason: "not found".to_string(),
            })?;
        let labels = pod.labels();

        let services = reader
            .list(
                ResourceKind::Service,
                &Scope::Namespace(target.namespace.clone()),
            )
            .await?;

        let selecting: BTreeSet<ObjectRef> = services
            .iter()
            .filter(|service| Self::selector(service).is_some_and(|s| Self::selects(s, &labels)))
            .map(ClusterObject::object_ref)
            .collect();

        debug!(pod = %target, services = selecting.len(), "resolved selecting services");
        Ok(selecting)
    }
}
