//! ServiceAccount matcher

use async_trait::async_trait;
use orphanage_cluster::{CandidateKind, ClusterObject, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;

use super::{
    find_matching, namespace_matches, DeclaredName, NamePredicate, ReferenceMatcher, Support,
};
use crate::error::Result;
use crate::target::Target;

/// ServiceAccounts reference Secrets through `secrets` and `imagePullSecrets`
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceAccountMatcher;

impl NamePredicate for ServiceAccountMatcher {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool {
        let ClusterObject::ServiceAccount(account) = object else {
            return false;
        };
        if target.kind != TargetKind::Secret {
            return false;
        }

        let in_secrets = account.secrets.iter().flatten().any(|secret| {
            secret.name.names(&target.name)
                && namespace_matches(&secret.namespace, &target.namespace)
        });

        let in_pull_secrets = account
            .image_pull_secrets
            .iter()
            .flatten()
            .any(|secret| secret.name.names(&target.name));

        in_secrets || in_pull_secrets
    }
}

#[async_trait]
impl ReferenceMatcher for ServiceAccountMatcher {
    fn kind(&self) -> CandidateKind {
        CandidateKind::ServiceAccount
    }

    fn support(&self, target: TargetKind) -> Support {
        match target {
            TargetKind::Secret => Support::ByName,
            TargetKind::ConfigMap | TargetKind::Service | TargetKind::Pod => Support::Never,
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
        find_matching(reader, CandidateKind::ServiceAccount, target, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orphanage_cluster::manifest::parse_documents;

    #[test]
    fn test_secrets_and_pull_secrets() {
        let objects = parse_documents(
            r#"
apiVersion: v1
kind: ServiceAccount
metadata:
  name: builder
  namespace: ci
secrets:
  - name: token
  - name: elsewhere
    namespace: other
imagePullSecrets:
  - name: registry
"#,
        )
        .unwrap();
        let account = &objects[0];
        let secret = |name: &str| Target::new(TargetKind::Secret, "ci", name);

        assert!(ServiceAccountMatcher.references(account, &secret("token")));
        assert!(ServiceAccountMatcher.references(account, &secret("registry")));
        assert!(!ServiceAccountMatcher.references(account, &secret("elsewhere")));
        assert!(!ServiceAccountMatcher.references(
            account,
            &Target::new(TargetKind::ConfigMap, "ci", "token")
        ));
    }
}
