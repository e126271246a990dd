//! Policies and their status through the Kubernetes API

use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::Client;
use orphanage_analyzer::OrphanReport;
use serde_json::json;

use crate::controller::PolicySource;
use crate::policy::{OrphanagePolicy, OrphanagePolicyStatus, PolicyKey};
use crate::status::{policy_key, StatusPublisher, StatusWriteError};

/// Field manager recorded on status writes
pub const FIELD_MANAGER: &str = "orphanage";

/// [`PolicySource`] and [`StatusPublisher`] backed by `OrphanagePolicy`
/// objects
#[derive(Clone)]
pub struct KubePolicies {
    client: Client,
}

impl KubePolicies {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced(&self, namespace: &str) -> Api<OrphanagePolicy> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl PolicySource for KubePolicies {
    async fn list(&self) -> Result<Vec<PolicyKey>> {
        let policies = Api::<OrphanagePolicy>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .context("Failed to list OrphanagePolicy objects")?;

        Ok(policies.items.iter().filter_map(OrphanagePolicy::key).collect())
    }

    async fn get(&self, key: &PolicyKey) -> Result<Option<OrphanagePolicy>> {
        self.namespaced(&key.namespace)
            .get_opt(&key.name)
            .await
            .with_context(|| format!("Failed to get OrphanagePolicy {key}"))
    }
}

#[async_trait]
impl StatusPublisher for KubePolicies {
    async fn publish(
        &self,
        policy: &OrphanagePolicy,
        report: &OrphanReport,
    ) -> Result<OrphanagePolicyStatus, StatusWriteError> {
        let key = policy_key(policy)?;
        let status = OrphanagePolicyStatus::from_report(policy.status.as_ref(), report);
        let patch = json!({ "status": status });

        self.namespaced(&key.namespace)
            .patch_status(
                &key.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| StatusWriteError::Write {
                policy: key.clone(),
                message: e.to_string(),
            })?;

        Ok(status)
    }
}
