//! Cluster read errors

use crate::kinds::ResourceKind;

/// A list or get against cluster state did not produce a result
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClusterError {
    /// The underlying request failed
    #[error("failed to {} {}{}: {}", .verb, .kind, scope_suffix(.namespace), .message)]
    Request {
        verb: &'static str,
        kind: ResourceKind,
        namespace: Option<String>,
        message: String,
    },

    /// The pass was cancelled before the read completed
    #[error("cluster read cancelled")]
    Cancelled,

    /// The pass ran past its deadline
    #[error("cluster read exceeded the evaluation deadline")]
    DeadlineExceeded,
}

impl ClusterError {
    pub fn list(kind: ResourceKind, namespace: Option<&str>, message: impl Into<String>) -> Self {
        ClusterError::Request {
            verb: "list",
            kind,
            namespace: namespace.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn get(kind: ResourceKind, namespace: Option<&str>, message: impl Into<String>) -> Self {
        ClusterError::Request {
            verb: "get",
            kind,
            namespace: namespace.map(str::to_string),
            message: message.into(),
        }
    }

    /// Whether the read was aborted by cancellation or deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ClusterError::Cancelled | ClusterError::DeadlineExceeded)
    }
}

fn scope_suffix(namespace: &Option<String>) -> String {
    match namespace {
        Some(namespace) => format!(" in namespace {namespace}"),
        None => String::new(),
    }
}
