//! Publishing reports onto policy status

use async_trait::async_trait;
use orphanage_analyzer::OrphanReport;

use crate::policy::{OrphanagePolicy, OrphanagePolicyStatus, PolicyKey};

#[derive(Debug, thiserror::Error)]
pub enum StatusWriteError {
    /// The policy has no namespace, so its status cannot be addressed
    #[error("policy {0} has no namespace")]
    Unplaced(String),

    #[error("failed to write status for policy {policy}: {message}")]
    Write { policy: PolicyKey, message: String },
}

/// Persists an evaluation result on the policy that asked for it
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    /// Write the status derived from `report` onto `policy` and return it
    async fn publish(
        &self,
        policy: &OrphanagePolicy,
        report: &OrphanReport,
    ) -> Result<OrphanagePolicyStatus, StatusWriteError>;
}

/// Key of `policy`, or the error reported when it has none
pub(crate) fn policy_key(policy: &OrphanagePolicy) -> Result<PolicyKey, StatusWriteError> {
    policy.key().ok_or_else(|| {
        StatusWriteError::Unplaced(policy.metadata.name.clone().unwrap_or_default())
    })
}
