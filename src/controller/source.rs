//! Where the control loop reads policies from

use anyhow::Result;
use async_trait::async_trait;
use orphanage_analyzer::OrphanReport;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::policy::{OrphanagePolicy, OrphanagePolicyStatus, PolicyKey};
use crate::status::{policy_key, StatusPublisher, StatusWriteError};

/// Read access to policy objects
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Every policy that currently exists
    async fn list(&self) -> Result<Vec<PolicyKey>>;

    /// The current state of one policy, `None` once deleted
    async fn get(&self, key: &PolicyKey) -> Result<Option<OrphanagePolicy>>;
}

/// Policies held in memory.
///
/// Serves as both the policy source and the status publisher, so published
/// status is visible on the stored policy the way it is on a real object.
#[derive(Default)]
pub struct InMemoryPolicies {
    policies: RwLock<BTreeMap<PolicyKey, OrphanagePolicy>>,
    failing_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryPolicies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a policy, keeping any status it already has
    pub async fn apply(&self, mut policy: OrphanagePolicy) -> Result<PolicyKey> {
        let key = policy_key(&policy)?;
        let mut policies = self.policies.write().await;
        if policy.status.is_none() {
            policy.status = policies.get(&key).and_then(|existing| existing.status.clone());
        }
        policies.insert(key.clone(), policy);
        Ok(key)
    }

    pub async fn remove(&self, key: &PolicyKey) -> bool {
        self.policies.write().await.remove(key).is_some()
    }

    /// Last published status of a policy
    pub async fn status(&self, key: &PolicyKey) -> Option<OrphanagePolicyStatus> {
        self.policies
            .read()
            .await
            .get(key)
            .and_then(|policy| policy.status.clone())
    }

    /// Make status writes fail until called again with `false`
    pub fn fail_writes(&self, failing: bool) {
        self.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Number of successful status writes
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicySource for InMemoryPolicies {
    async fn list(&self) -> Result<Vec<PolicyKey>> {
        Ok(self.policies.read().await.keys().cloned().collect())
    }

    async fn get(&self, key: &PolicyKey) -> Result<Option<OrphanagePolicy>> {
        Ok(self.policies.read().await.get(key).cloned())
    }
}

#[async_trait]
impl StatusPublisher for InMemoryPolicies {
    async fn publish(
        &self,
        policy: &OrphanagePolicy,
        report: &OrphanReport,
    ) -> Result<OrphanagePolicyStatus, StatusWriteError> {
        let key = policy_key(policy)?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(StatusWriteError::Write {
                policy: key,
                message: "injected write failure".to_string(),
            });
        }

        let status = OrphanagePolicyStatus::from_report(policy.status.as_ref(), report);
        let mut policies = self.policies.write().await;
        let Some(stored) = policies.get_mut(&key) else {
            return Err(StatusWriteError::Write {
                policy: key,
                message: "policy not found".to_string(),
            });
        };
        stored.status = Some(status.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(status)
    }
}
