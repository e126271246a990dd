//! CustomResourceDefinition matcher

use async_trait::async_trait;
use orphanage_cluster::{CandidateKind, ClusterObject, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;

use super::{
    find_matching, namespace_matches, DeclaredName, NamePredicate, ReferenceMatcher, Support,
};
use crate::error::Result;
use crate::target::Target;

/// CRDs reference the Service serving their conversion webhook.
///
/// CRDs have no structural path to Secrets or ConfigMaps, so those lookups
/// return nothing without listing.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomResourceDefinitionMatcher;

impl NamePredicate for CustomResourceDefinitionMatcher {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool {
        let ClusterObject::CustomResourceDefinition(crd) = object else {
            return false;
        };
        if target.kind != TargetKind::Service {
            return false;
        }

        crd.spec
            .conversion
            .as_ref()
            .and_then(|conversion| conversion.webhook.as_ref())
            .and_then(|webhook| webhook.client_config.as_ref())
            .and_then(|config| config.service.as_ref())
            .is_some_and(|service| {
                service.name.names(&target.name)
                    && namespace_matches(&service.namespace, &target.namespace)
            })
    }
}

#[async_trait]
impl ReferenceMatcher for CustomResourceDefinitionMatcher {
    fn kind(&self) -> CandidateKind {
        CandidateKind::CustomResourceDefinition
    }

    fn support(&self, target: TargetKind) -> Support {
        match target {
            TargetKind::Service => Support::ByName,
            TargetKind::Secret | TargetKind::ConfigMap | TargetKind::Pod => Support::Never,
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
        find_matching(reader, CandidateKind::CustomResourceDefinition, target, self).await
    }
}
