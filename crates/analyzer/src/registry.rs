//! Matcher registry

use orphanage_cluster::{CandidateKind, TargetKind, UnsupportedKind};
use std::collections::BTreeMap;
use std::fmt;

use crate::matchers::{
    ApiServiceMatcher, CustomResourceDefinitionMatcher, IngressMatcher, PodSpecPath,
    ReferenceMatcher, ServiceAccountMatcher, ServiceMatcher, Support, WebhookFlavor,
    WebhookMatcher, WorkloadMatcher,
};

/// Lookup table from candidate kind to its matcher.
///
/// Built once from the fixed set of candidate kinds and owned by whoever runs
/// discovery. Holds no mutable state.
pub struct MatcherRegistry {
    matchers: BTreeMap<CandidateKind, Box<dyn ReferenceMatcher>>,
}

impl MatcherRegistry {
    /// Registry with a matcher for every candidate kind
    pub fn new() -> Self {
        let matchers = CandidateKind::ALL
            .into_iter()
            .map(|kind| (kind, builtin_matcher(kind)))
            .collect();
        Self { matchers }
    }

    /// Matcher for `kind`
    pub fn resolve(&self, kind: CandidateKind) -> Result<&dyn ReferenceMatcher, UnsupportedKind> {
        self.matchers
            .get(&kind)
            .map(Box::as_ref)
            .ok_or_else(|| UnsupportedKind(kind.label().to_string()))
    }

    /// Matcher for a kind label such as `"Deployment"`
    pub fn resolve_label(&self, label: &str) -> Result<&dyn ReferenceMatcher, UnsupportedKind> {
        self.resolve(label.parse()?)
    }

    /// Registered matchers in candidate-kind order
    pub fn matchers(&self) -> impl Iterator<Item = &dyn ReferenceMatcher> {
        self.matchers
            .values()
            .map(|matcher| -> &dyn ReferenceMatcher { matcher.as_ref() })
    }

    /// Matchers that can reference `target` at all
    pub fn capable_of(&self, target: TargetKind) -> impl Iterator<Item = &dyn ReferenceMatcher> {
        self.matchers()
            .filter(move |matcher| matcher.support(target).is_possible())
    }

    /// How every candidate kind can reference `target`
    pub fn coverage(&self, target: TargetKind) -> Vec<(CandidateKind, Support)> {
        self.matchers()
            .map(|matcher| (matcher.kind(), matcher.support(target)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Default for MatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.matchers.keys()).finish()
    }
}

/// The matcher implementing each candidate kind.
///
/// Adding a candidate kind fails to compile until it is given a matcher here.
fn builtin_matcher(kind: CandidateKind) -> Box<dyn ReferenceMatcher> {
    match kind {
        CandidateKind::Pod => Box::new(WorkloadMatcher::with_path(kind, PodSpecPath::Direct)),
        CandidateKind::Deployment
        | CandidateKind::StatefulSet
        | CandidateKind::DaemonSet
        | CandidateKind::ReplicaSet
        | CandidateKind::Job => Box::new(WorkloadMatcher::with_path(kind, PodSpecPath::Template)),
        CandidateKind::CronJob => {
            Box::new(WorkloadMatcher::with_path(kind, PodSpecPath::JobTemplate))
        }
        CandidateKind::Ingress => Box::new(IngressMatcher),
        CandidateKind::ServiceAccount => Box::new(ServiceAccountMatcher),
        CandidateKind::Service => Box::new(ServiceMatcher),
        CandidateKind::ValidatingWebhookConfiguration => {
            Box::new(WebhookMatcher::new(WebhookFlavor::Validating))
        }
        CandidateKind::MutatingWebhookConfiguration => {
            Box::new(WebhookMatcher::new(WebhookFlavor::Mutating))
        }
        CandidateKind::ApiService => Box::new(ApiServiceMatcher),
        CandidateKind::CustomResourceDefinition => Box::new(CustomResourceDefinitionMatcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_candidate_kind_resolves_to_its_own_matcher() {
        let registry = MatcherRegistry::new();
        assert_eq!(registry.len(), CandidateKind::ALL.len());

        for kind in CandidateKind::ALL {
            assert_eq!(registry.resolve(kind).unwrap().kind(), kind);
            assert_eq!(registry.resolve_label(kind.label()).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_unknown_labels_are_unsupported() {
        let registry = MatcherRegistry::new();

        for label in ["Namespace", "deployment", "Apiservice", ""] {
            let err = registry.resolve_label(label).err().unwrap();
            assert_eq!(err, UnsupportedKind(label.to_string()));
        }
    }

    #[test]
    fn test_monitorable_kinds_have_referencing_matchers() {
        let registry = MatcherRegistry::new();

        for target in TargetKind::MONITORABLE {
            let capable: Vec<_> = registry.capable_of(target).map(|m| m.kind()).collect();
            assert!(capable.contains(&CandidateKind::Pod));
            assert!(capable.contains(&CandidateKind::CronJob));
        }

        let secrets: Vec<_> = registry
            .capable_of(TargetKind::Secret)
            .map(|m| m.kind())
            .collect();
        assert!(secrets.contains(&CandidateKind::Ingress));
        assert!(secrets.contains(&CandidateKind::ServiceAccount));
        assert!(!secrets.contains(&CandidateKind::CustomResourceDefinition));
    }

    #[test]
    fn test_coverage_lists_every_candidate() {
        let registry = MatcherRegistry::new();
        let coverage = registry.coverage(TargetKind::Pod);

        assert_eq!(coverage.len(), CandidateKind::ALL.len());
        assert!(coverage.contains(&(CandidateKind::Service, Support::BySelector)));
        assert!(coverage.contains(&(CandidateKind::Deployment, Support::Never)));
    }
}
