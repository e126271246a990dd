//! APIService matcher

use async_trait::async_trait;
use orphanage_cluster::{CandidateKind, ClusterObject, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;

use super::{
    find_matching, namespace_matches, DeclaredName, NamePredicate, ReferenceMatcher, Support,
};
use crate::error::Result;
use crate::target::Target;

/// Aggregated API registrations reference the Service backing them.
/// Local APIServices carry no service and reference nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApiServiceMatcher;

impl NamePredicate for ApiServiceMatcher {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool {
        let ClusterObject::ApiService(api_service) = object else {
            return false;
        };
        if target.kind != TargetKind::Service {
            return false;
        }

        api_service
            .spec
            .as_ref()
            .and_then(|spec| spec.service.as_ref())
            .is_some_and(|service| {
                service.name.names(&target.name)
                    && namespace_matches(&service.namespace, &target.namespace)
            })
    }
}

#[async_trait]
impl ReferenceMatcher for ApiServiceMatcher {
    fn kind(&self) -> CandidateKind {
        CandidateKind::ApiService
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
        find_matching(reader, CandidateKind::ApiService, target, self).await
    }
}
