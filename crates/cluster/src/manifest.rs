//! Load cluster objects from YAML manifests on disk

use glob::Pattern;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::object::ClusterObject;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid manifest filter: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Reads manifests from files and directories
#[derive(Debug, Default)]
pub struct ManifestLoader {
    filters: Vec<Pattern>,

    /// Namespace given to namespaced objects that declare none
    default_namespace: Option<String>,
}

impl ManifestLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only load files whose path relative to the scanned directory matches
    /// at least one of the glob `filters`
    pub fn with_filters(filters: &[String]) -> Result<Self, ManifestError> {
        let filters = filters
            .iter()
            .map(|filter| Pattern::new(filter))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            filters,
            default_namespace: None,
        })
    }

    /// Place namespaced objects without `metadata.namespace` into `namespace`
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    /// Load every YAML manifest under `dir`
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<ClusterObject>, ManifestError> {
        info!("Loading manifests from directory: {:?}", dir);

        let mut objects = Vec::new();

        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();

            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                continue;
            }

            let relative = path.strip_prefix(dir).unwrap_or(path);
            if !self.matches_filters(relative) {
                debug!("Skipping {:?}, no filter matches", relative);
                continue;
            }

            objects.extend(self.load_file(path)?);
        }

        info!("Loaded {} objects from {:?}", objects.len(), dir);
        Ok(objects)
    }

    /// Load every supported object from one file
    pub fn load_file(&self, path: &Path) -> Result<Vec<ClusterObject>, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut objects = parse_documents(&content).map_err(|source| ManifestError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(namespace) = &self.default_namespace {
            for object in &mut objects {
                object.default_namespace(namespace);
            }
        }
        Ok(objects)
    }

    fn matches_filters(&self, relative: &Path) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|p| p.matches_path(relative))
    }
}

/// Parse a multi-document YAML stream.
///
/// `kind: List` documents are flattened into their items. Documents of kinds
/// the auditor does not read are skipped.
pub fn parse_documents(content: &str) -> Result<Vec<ClusterObject>, serde_yaml::Error> {
    let mut objects = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value = serde_yaml::Value::deserialize(document)?;
        collect_objects(value, &mut objects)?;
    }

    Ok(objects)
}

fn collect_objects(
    value: serde_yaml::Value,
    objects: &mut Vec<ClusterObject>,
) -> Result<(), serde_yaml::Error> {
    if value.is_null() {
        return Ok(());
    }

    if value.get("kind").and_then(|k| k.as_str()) == Some("List") {
        if let Some(items) = value.get("items").and_then(|i| i.as_sequence()) {
            for item in items.clone() {
                collect_objects(item, objects)?;
            }
        }
        return Ok(());
    }

    if let Some(object) = ClusterObject::from_manifest(value)? {
        objects.push(object);
    }
    Ok(())
}
