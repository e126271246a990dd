//! Admission webhook configuration matchers

use async_trait::async_trait;
use k8s_openapi::api::admissionregistration::v1::WebhookClientConfig;
use orphanage_cluster::{CandidateKind, ClusterObject, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;

use super::{
    find_matching, namespace_matches, DeclaredName, NamePredicate, ReferenceMatcher, Support,
};
use crate::error::Result;
use crate::target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFlavor {
    Validating,
    Mutating,
}

/// Webhook configurations reference the Services that serve their webhooks
#[derive(Debug, Clone, Copy)]
pub struct WebhookMatcher {
    flavor: WebhookFlavor,
}

impl WebhookMatcher {
    pub fn new(flavor: WebhookFlavor) -> Self {
        Self { flavor }
    }

    pub fn flavor(&self) -> WebhookFlavor {
        self.flavor
    }

    fn client_configs(object: &ClusterObject) -> Vec<&WebhookClientConfig> {
        match object {
            ClusterObject::ValidatingWebhookConfiguration(config) => config
                .webhooks
                .iter()
                .flatten()
                .map(|webhook| &webhook.client_config)
                .collect(),
            ClusterObject::MutatingWebhookConfiguration(config) => config
                .webhooks
                .iter()
                .flatten()
                .map(|webhook| &webhook.client_config)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl NamePredicate for WebhookMatcher {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool {
        if target.kind != TargetKind::Service {
            return false;
        }

        Self::client_configs(object).into_iter().any(|config| {
            config.service.as_ref().is_some_and(|service| {
                service.name.names(&target.name)
                    && namespace_matches(&service.namespace, &target.namespace)
            })
        })
    }
}

#[async_trait]
impl ReferenceMatcher for WebhookMatcher {
    fn kind(&self) -> CandidateKind {
        match self.flavor {
            WebhookFlavor::Validating => CandidateKind::ValidatingWebhookConfiguration,
            WebhookFlavor::Mutating => CandidateKind::MutatingWebhookConfiguration,
        }
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
        find_matching(reader, self.kind(), target, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orphanage_cluster::manifest::parse_documents;

    const WEBHOOKS: &str = r#"
apiVersion: admissionregistration.k8s.io/v1
kind: ValidatingWebhookConfiguration
metadata:
  name: policy
webhooks:
  - name: validate.policy.example.com
    admissionReviewVersions: [v1]
    sideEffects: None
    clientConfig:
      service:
        name: policy-webhook
        namespace: system
---
apiVersion: admissionregistration.k8s.io/v1
kind: MutatingWebhookConfiguration
metadata:
  name: injector
webhooks:
  - name: inject.example.com
    admissionReviewVersions: [v1]
    sideEffects: None
    clientConfig:
      url: https://injector.example.com/mutate
"#;

    #[test]
    fn test_service_namespace_must_match() {
        let objects = parse_documents(WEBHOOKS).unwrap();
        let matcher = WebhookMatcher::new(WebhookFlavor::Validating);

        assert!(matcher.references(
            &objects[0],
            &Target::new(TargetKind::Service, "system", "policy-webhook")
        ));
        assert!(!matcher.references(
            &objects[0],
            &Target::new(TargetKind::Service, "default", "policy-webhook")
        ));
    }

    #[test]
    fn test_url_webhooks_reference_nothing() {
        let objects = parse_documents(WEBHOOKS).unwrap();
        let matcher = WebhookMatcher::new(WebhookFlavor::Mutating);

        assert_eq!(matcher.kind(), CandidateKind::MutatingWebhookConfiguration);
        assert!(!matcher.references(
            &objects[1],
            &Target::new(TargetKind::Service, "system", "injector")
        ));
    }

    #[test]
    fn test_only_services_are_supported() {
        let matcher = WebhookMatcher::new(WebhookFlavor::Validating);
        assert_eq!(matcher.support(TargetKind::Service), Support::ByName);
        assert_eq!(matcher.support(TargetKind::Secret), Support::Never);
        assert_eq!(matcher.support(TargetKind::ConfigMap), Support::Never);
        assert_eq!(matcher.support(TargetKind::Pod), Support::Never);
    }
}
