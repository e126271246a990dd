//! Matchers for pods and kinds that wrap a pod template

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{EnvFromSource, EnvVar, PodSpec, Volume};
use orphanage_cluster::{CandidateKind, ClusterObject, ClusterReader, ObjectRef, TargetKind};
use std::collections::BTreeSet;

use super::{find_matching, DeclaredName, NamePredicate, ReferenceMatcher, Support};
use crate::error::Result;
use crate::target::Target;

/// Where the pod specification sits inside a workload object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodSpecPath {
    /// `spec`
    Direct,

    /// `spec.template.spec`
    Template,

    /// `spec.jobTemplate.spec.template.spec`
    JobTemplate,
}

impl PodSpecPath {
    pub fn for_kind(kind: CandidateKind) -> Option<Self> {
        match kind {
            CandidateKind::Pod => Some(PodSpecPath::Direct),
            CandidateKind::Deployment
            | CandidateKind::StatefulSet
            | CandidateKind::DaemonSet
            | CandidateKind::ReplicaSet
            | CandidateKind::Job => Some(PodSpecPath::Template),
            CandidateKind::CronJob => Some(PodSpecPath::JobTemplate),
            _ => None,
        }
    }

    /// Follow this path into `object`.
    ///
    /// Objects whose specification is absent, or whose kind does not sit at
    /// this path, have no pod spec and therefore reference nothing.
    pub fn resolve(self, object: &ClusterObject) -> Option<&PodSpec> {
        match (self, object) {
            (PodSpecPath::Direct, ClusterObject::Pod(pod)) => pod.spec.as_ref(),
            (PodSpecPath::Template, ClusterObject::Deployment(d)) => {
                d.spec.as_ref().and_then(|s| s.template.spec.as_ref())
            }
            (PodSpecPath::Template, ClusterObject::StatefulSet(s)) => {
                s.spec.as_ref().and_then(|s| s.template.spec.as_ref())
            }
            (PodSpecPath::Template, ClusterObject::DaemonSet(d)) => {
                d.spec.as_ref().and_then(|s| s.template.spec.as_ref())
            }
            (PodSpecPath::Template, ClusterObject::ReplicaSet(r)) => r
                .spec
                .as_ref()
                .and_then(|s| s.template.as_ref())
                .and_then(|t| t.spec.as_ref()),
            (PodSpecPath::Template, ClusterObject::Job(j)) => {
                j.spec.as_ref().and_then(|s| s.template.spec.as_ref())
            }
            (PodSpecPath::JobTemplate, ClusterObject::CronJob(c)) => c
                .spec
                .as_ref()
                .and_then(|s| s.job_template.spec.as_ref())
                .and_then(|s| s.template.spec.as_ref()),
            _ => None,
        }
    }
}

/// Whether a pod specification references a Secret or ConfigMap by name.
///
/// Checks volumes (including projected sources), `envFrom` and
/// `env[].valueFrom` on every container, init container and ephemeral
/// container, and for Secrets the image pull credentials.
pub fn pod_spec_references(spec: &PodSpec, kind: TargetKind, name: &str) -> bool {
    if !matches!(kind, TargetKind::Secret | TargetKind::ConfigMap) {
        return false;
    }

    let in_volumes = spec
        .volumes
        .iter()
        .flatten()
        .any(|volume| volume_references(volume, kind, name));

    let in_containers = container_env(spec)
        .any(|(env, env_from)| env_references(env, env_from, kind, name));

    let in_pull_secrets = kind == TargetKind::Secret
        && spec
            .image_pull_secrets
            .iter()
            .flatten()
            .any(|secret| secret.name.names(name));

    in_volumes || in_containers || in_pull_secrets
}

fn volume_references(volume: &Volume, kind: TargetKind, name: &str) -> bool {
    let projected = volume
        .projected
        .as_ref()
        .and_then(|p| p.sources.as_ref())
        .into_iter()
        .flatten();

    match kind {
        TargetKind::Secret => {
            volume
                .secret
                .as_ref()
                .is_some_and(|s| s.secret_name.names(name))
                || projected
                    .filter_map(|source| source.secret.as_ref())
                    .any(|s| s.name.names(name))
        }
        TargetKind::ConfigMap => {
            volume
                .config_map
                .as_ref()
                .is_some_and(|c| c.name.names(name))
                || projected
                    .filter_map(|source| source.config_map.as_ref())
                    .any(|c| c.name.names(name))
        }
        TargetKind::Service | TargetKind::Pod => false,
    }
}

type EnvLists<'a> = (&'a [EnvVar], &'a [EnvFromSource]);

fn container_env(spec: &PodSpec) -> impl Iterator<Item = EnvLists<'_>> {
    let containers = spec
        .containers
        .iter()
        .chain(spec.init_containers.iter().flatten())
        .map(|c| {
            (
                c.env.as_deref().unwrap_or_default(),
                c.env_from.as_deref().unwrap_or_default(),
            )
        });

    let ephemeral = spec.ephemeral_containers.iter().flatten().map(|c| {
        (
            c.env.as_deref().unwrap_or_default(),
            c.env_from.as_deref().unwrap_or_default(),
        )
    });

    containers.chain(ephemeral)
}

fn env_references(
    env: &[EnvVar],
    env_from: &[EnvFromSource],
    kind: TargetKind,
    name: &str,
) -> bool {
    match kind {
        TargetKind::Secret => {
            env_from
                .iter()
                .filter_map(|source| source.secret_ref.as_ref())
                .any(|s| s.name.names(name))
                || env
                    .iter()
                    .filter_map(|var| var.value_from.as_ref())
                    .filter_map(|from| from.secret_key_ref.as_ref())
                    .any(|s| s.name.names(name))
        }
        TargetKind::ConfigMap => {
            env_from
                .iter()
                .filter_map(|source| source.config_map_ref.as_ref())
                .any(|c| c.name.names(name))
                || env
                    .iter()
                    .filter_map(|var| var.value_from.as_ref())
                    .filter_map(|from| from.config_map_key_ref.as_ref())
                    .any(|c| c.name.names(name))
        }
        TargetKind::Service | TargetKind::Pod => false,
    }
}

/// Matcher shared by every pod-template-bearing kind.
///
/// Kinds differ only in the [`PodSpecPath`] used to reach the pod spec.
#[derive(Debug, Clone, Copy)]
pub struct WorkloadMatcher {
    kind: CandidateKind,
    path: PodSpecPath,
}

impl WorkloadMatcher {
    /// `None` when `kind` does not embed a pod specification
    pub fn new(kind: CandidateKind) -> Option<Self> {
        PodSpecPath::for_kind(kind).map(|path| Self { kind, path })
    }

    pub(crate) fn with_path(kind: CandidateKind, path: PodSpecPath) -> Self {
        Self { kind, path }
    }

    pub fn path(&self) -> PodSpecPath {
        self.path
    }
}

impl NamePredicate for WorkloadMatcher {
    fn references(&self, object: &ClusterObject, target: &Target) -> bool {
        self.path
            .resolve(object)
            .is_some_and(|spec| pod_spec_references(spec, target.kind, &target.name))
    }
}

#[async_trait]
impl ReferenceMatcher for WorkloadMatcher {
    fn kind(&self) -> CandidateKind {
        self.kind
    }

    fn support(&self, target: TargetKind) -> Support {
        match target {
            TargetKind::Secret | TargetKind::ConfigMap => Support::ByName,
            TargetKind::Service | TargetKind::Pod => Support::Never,
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
        find_matching(reader, self.kind, target, self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orphanage_cluster::manifest::parse_documents;
    use rstest::rstest;

    fn pod_spec(yaml: &str) -> PodSpec {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[rstest]
    #[case::secret_volume(
        "containers: []\nvolumes:\n  - name: v\n    secret:\n      secretName: target",
        TargetKind::Secret
    )]
    #[case::configmap_volume(
        "containers: []\nvolumes:\n  - name: v\n    configMap:\n      name: target",
        TargetKind::ConfigMap
    )]
    #[case::projected_secret(
        "containers: []\nvolumes:\n  - name: v\n    projected:\n      sources:\n        - secret:\n            name: target",
        TargetKind::Secret
    )]
    #[case::projected_configmap(
        "containers: []\nvolumes:\n  - name: v\n    projected:\n      sources:\n        - configMap:\n            name: target",
        TargetKind::ConfigMap
    )]
    #[case::env_from_secret(
        "containers:\n  - name: c\n    envFrom:\n      - secretRef:\n          name: target",
        TargetKind::Secret
    )]
    #[case::env_from_configmap(
        "containers:\n  - name: c\n    envFrom:\n      - configMapRef:\n          name: target",
        TargetKind::ConfigMap
    )]
    #[case::env_secret_key(
        "containers:\n  - name: c\n    env:\n      - name: E\n        valueFrom:\n          secretKeyRef:\n            name: target\n            key: k",
        TargetKind::Secret
    )]
    #[case::env_configmap_key(
        "containers:\n  - name: c\n    env:\n      - name: E\n        valueFrom:\n          configMapKeyRef:\n            name: target\n            key: k",
        TargetKind::ConfigMap
    )]
    #[case::init_container(
        "containers: []\ninitContainers:\n  - name: i\n    envFrom:\n      - secretRef:\n          name: target",
        TargetKind::Secret
    )]
    #[case::ephemeral_container(
        "containers: []\nephemeralContainers:\n  - name: e\n    envFrom:\n      - configMapRef:\n          name: target",
        TargetKind::ConfigMap
    )]
    #[case::image_pull_secret(
        "containers: []\nimagePullSecrets:\n  - name: target",
        TargetKind::Secret
    )]
    fn test_pod_spec_reference_paths(#[case] yaml: &str, #[case] kind: TargetKind) {
        let spec = pod_spec(yaml);
        assert!(pod_spec_references(&spec, kind, "target"));
        assert!(!pod_spec_references(&spec, kind, "other"));
        assert!(!pod_spec_references(&spec, kind, "Target"));
    }

    #[test]
    fn test_kinds_do_not_cross() {
        let spec = pod_spec(
            "containers: []\nimagePullSecrets:\n  - name: target\nvolumes:\n  - name: v\n    secret:\n      secretName: target",
        );
        assert!(pod_spec_references(&spec, TargetKind::Secret, "target"));
        assert!(!pod_spec_references(&spec, TargetKind::ConfigMap, "target"));
        assert!(!pod_spec_references(&spec, TargetKind::Service, "target"));
    }

    #[test]
    fn test_template_kinds_use_nested_spec() {
        let objects = parse_documents(
            r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: default
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: nginx
          envFrom:
            - configMapRef:
                name: web-config
---
apiVersion: batch/v1
kind: CronJob
metadata:
  name: backup
  namespace: default
spec:
  schedule: "0 * * * *"
  jobTemplate:
    spec:
      template:
        spec:
          restartPolicy: Never
          containers:
            - name: backup
              image: busybox
          volumes:
            - name: creds
              secret:
                secretName: backup-creds
"#,
        )
        .unwrap();

        let deployment = WorkloadMatcher::new(CandidateKind::Deployment).unwrap();
        let cron_job = WorkloadMatcher::new(CandidateKind::CronJob).unwrap();
        assert_eq!(cron_job.path(), PodSpecPath::JobTemplate);

        let web_config = Target::new(TargetKind::ConfigMap, "default", "web-config");
        let backup_creds = Target::new(TargetKind::Secret, "default", "backup-creds");

        assert!(deployment.references(&objects[0], &web_config));
        assert!(!deployment.references(&objects[1], &backup_creds));
        assert!(cron_job.references(&objects[1], &backup_creds));
        assert!(!cron_job.references(&objects[0], &web_config));
    }

    #[test]
    fn test_only_pod_template_kinds_get_a_workload_matcher() {
        assert!(WorkloadMatcher::new(CandidateKind::Ingress).is_none());
        assert!(WorkloadMatcher::new(CandidateKind::Service).is_none());
        assert_eq!(
            WorkloadMatcher::new(CandidateKind::Pod).unwrap().path(),
            PodSpecPath::Direct
        );
    }
}
