//! Per-kind reference matchers
//!
//! A matcher belongs to one candidate kind. It lists candidates of that kind
//! and decides, per candidate, whether the candidate structurally points at a
//! target. Every candidate kind declares for every target kind how it can
//! reference it, including explicitly that it cannot.

use async_trait::async_trait;
use orphanage_cluster::{
    CandidateKind, ClusterObject, ClusterReader, ObjectRef, Scope, TargetKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::target::Target;

pub mod api_service;
pub mod crd;
pub mod ingress;
pub mod service;
pub mod service_account;
pub mod webhook;
pub mod workload;

pub use api_service::ApiServiceMatcher;
pub use crd::CustomResourceDefinitionMatcher;
pub use ingress::IngressMatcher;
pub use service::ServiceMatcher;
pub use service_account::ServiceAccountMatcher;
pub use webhook::{WebhookFlavor, WebhookMatcher};
pub use workload::{pod_spec_references, PodSpecPath, WorkloadMatcher};

/// How a candidate kind can reference a target kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    /// A declared name field points at the target
    ByName,

    /// A label selector matches the target's labels
    BySelector,

    /// Structurally impossible; lookups return no references
    Never,
}

impl Support {
    pub fn is_possible(&self) -> bool {
        !matches!(self, Support::Never)
    }
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Support::ByName => "name",
            Support::BySelector => "selector",
            Support::Never => "-",
        };
        f.write_str(label)
    }
}

/// Finds candidates of one kind that reference a target
#[async_trait]
pub trait ReferenceMatcher: Send + Sync {
    /// Candidate kind this matcher inspects
    fn kind(&self) -> CandidateKind;

    /// How this kind can reference `target`
    fn support(&self, target: TargetKind) -> Support;

    /// Candidates of this kind that reference `target`.
    ///
    /// Returns an empty set without reading cluster state when
    /// [`ReferenceMatcher::support`] is [`Support::Never`].
    async fn find_references(
        &self,
        reader: &ClusterReader,
        target: &Target,
    ) -> Result<BTreeSet<ObjectRef>>;
}

/// Pure per-object predicate used by name-field matchers
pub trait NamePredicate {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool;
}

/// List candidates of `kind` visible to `target` and keep those matching.
///
/// Namespaced kinds are listed in the target's namespace. Cluster-scoped
/// kinds are listed without a namespace filter; the predicate is responsible
/// for checking the namespace carried by the reference.
pub(crate) async fn find_matching<P>(
    reader: &ClusterReader,
    kind: CandidateKind,
    target: &Target,
    predicate: &P,
) -> Result<BTreeSet<ObjectRef>>
where
    P: NamePredicate + Sync,
{
    let scope = if kind.is_namespaced() {
        Scope::Namespace(target.namespace.clone())
    } else {
        Scope::Cluster
    };

    let candidates = reader.list(kind.into(), &scope).await?;
    Ok(candidates
        .iter()
        .filter(|object| predicate.references(object, target))
        .map(ClusterObject::object_ref)
        .collect())
}

/// A name field as declared on an API type.
///
/// API types carry reference names either as required strings (where the
/// empty string means unset) or as optional strings.
pub(crate) trait DeclaredName {
    fn declared(&self) -> Option<&str>;

    fn names(&self, name: &str) -> bool {
        self.declared() == Some(name)
    }
}

impl DeclaredName for String {
    fn declared(&self) -> Option<&str> {
        (!self.is_empty()).then_some(self.as_str())
    }
}

impl DeclaredName for Option<String> {
    fn declared(&self) -> Option<&str> {
        self.as_deref().filter(|name| !name.is_empty())
    }
}

/// A reference carrying its own namespace points into `namespace`.
///
/// An unset namespace means the target's own namespace.
pub(crate) fn namespace_matches(declared: &impl DeclaredName, namespace: &str) -> bool {
    declared.declared().map_or(true, |declared| declared == namespace)
}
