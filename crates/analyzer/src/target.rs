//! Lookup targets

use orphanage_cluster::{ObjectRef, TargetKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An object whose inbound references are being looked up
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub namespace: String,
    pub name: String,
}

impl Target {
    pub fn new(kind: TargetKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::namespaced(self.kind.into(), self.namespace.clone(), self.name.clone())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}
