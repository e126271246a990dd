//! Ingress matcher

use async_trait::async_trait;
use k8s_openapi::api::networking::v1::{Ingress, IngressBackend};
use orphanage_cluster::{CandidateKind, ClusterObject, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;

use super::{find_matching, DeclaredName, NamePredicate, ReferenceMatcher, Support};
use crate::error::Result;
use crate::target::Target;

/// Ingresses reference Secrets through TLS termination and Services through
/// their backends. They never reference ConfigMaps.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngressMatcher;

impl IngressMatcher {
    fn tls_references(ingress: &Ingress, name: &str) -> bool {
        ingress
            .spec
            .as_ref()
            .and_then(|spec| spec.tls.as_ref())
            .into_iter()
            .flatten()
            .any(|tls| tls.secret_name.names(name))
    }

    fn backend_references(ingress: &Ingress, name: &str) -> bool {
        let Some(spec) = ingress.spec.as_ref() else {
            return false;
        };

        let references = |backend: &IngressBackend| {
            backend
                .service
                .as_ref()
                .is_some_and(|service| service.name.names(name))
        };

        spec.default_backend.as_ref().is_some_and(references)
            || spec
                .rules
                .iter()
                .flatten()
                .filter_map(|rule| rule.http.as_ref())
                .flat_map(|http| http.paths.iter())
                .any(|path| references(&path.backend))
    }
}

impl NamePredicate for IngressMatcher {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool {
        let ClusterObject::Ingress(ingress) = object else {
            return false;
        };

        match target.kind {
            TargetKind::Secret => Self::tls_references(ingress, &target.name),
            TargetKind::Service => Self::backend_references(ingress, &target.name),
            TargetKind::ConfigMap | TargetKind::Pod => false,
        }
    }
}

#[async_trait]
impl ReferenceMatcher for IngressMatcher {
    fn kind(&self) -> CandidateKind {
        CandidateKind::Ingress
    }

    fn support(&self, target: TargetKind) -> Support {
        match target {
            TargetKind::Secret | TargetKind::Service => Support::ByName,
            TargetKind::ConfigMap | TargetKind::Pod => Support::Never,
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
        find_matching(reader, CandidateKind::Ingress, target, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orphanage_cluster::manifest::parse_documents;

    const INGRESS: &str = r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
  namespace: default
spec:
  tls:
    - hosts: [example.com]
      secretName: tls-secret
  defaultBackend:
    service:
      name: fallback
      port:
        number: 80
  rules:
    - host: example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  number: 8080
"#;

    #[test]
    fn test_tls_secret_is_referenced() {
        let objects = parse_documents(INGRESS).unwrap();
        let matcher = IngressMatcher;

        assert!(matcher.references(
            &objects[0],
            &Target::new(TargetKind::Secret, "default", "tls-secret")
        ));
        assert!(!matcher.references(
            &objects[0],
            &Target::new(TargetKind::Secret, "default", "other")
        ));
    }

    #[test]
    fn test_configmaps_are_never_referenced() {
        let objects = parse_documents(INGRESS).unwrap();
        let target = Target::new(TargetKind::ConfigMap, "default", "tls-secret");

        assert!(!IngressMatcher.references(&objects[0], &target));
        assert_eq!(IngressMatcher.support(TargetKind::ConfigMap), Support::Never);
    }

    #[test]
    fn test_backend_services_are_referenced() {
        let objects = parse_documents(INGRESS).unwrap();

        for name in ["web", "fallback"] {
            assert!(IngressMatcher.references(
                &objects[0],
                &Target::new(TargetKind::Service, "default", name)
            ));
        }
        assert!(!IngressMatcher.references(
            &objects[0],
            &Target::new(TargetKind::Service, "default", "tls-secret")
        ));
    }
}
