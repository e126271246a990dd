//! Analyzer error taxonomy

use orphanage_cluster::{ClusterError, TargetKind, UnsupportedKind};

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// A list or get against cluster state failed
    #[error("cluster read failed: {0}")]
    ClusterRead(#[from] ClusterError),

    /// A kind outside the fixed enumeration was requested
    #[error(transparent)]
    UnsupportedKind(#[from] UnsupportedKind),

    /// The object a selector lookup starts from could not be fetched
    #[error("cannot resolve {kind} {namespace}/{name}: {reason}")]
    TargetResolution {
        kind: TargetKind,
        namespace: String,
        name: String,
        reason: String,
    },
}

impl AnalyzerError {
    /// Configuration errors that retrying cannot fix
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalyzerError::UnsupportedKind(_))
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, AnalyzerError::ClusterRead(e) if e.is_cancellation())
    }
}

pub type Result<T, E = AnalyzerError> = std::result::Result<T, E>;
