//! Main configuration structure and implementation

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ControllerConfig, ScanConfig};

/// Configuration file names looked up in the working directory
pub const LOCAL_CONFIG_FILES: [&str; 2] = [".orphanage.yaml", "orphanage.yaml"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Control loop settings
    #[serde(default)]
    pub controller: ControllerConfig,

    /// Offline scan settings
    #[serde(default)]
    pub scan: ScanConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.version != "1.0" {
            return Err(anyhow!(
                "Unsupported configuration version: {}",
                self.version
            ));
        }

        self.controller.validate()?;
        self.scan.validate()?;

        Ok(())
    }

    /// Load the configuration that applies to this invocation.
    ///
    /// An explicit path must exist. Otherwise the working directory and then
    /// the user config directory are searched, falling back to defaults.
    pub fn resolve(explicit: Option<&str>) -> Result<Self> {
        match Self::locate(explicit)? {
            Some(path) => {
                debug!("Using configuration file {:?}", path);
                Self::from_file(&path)
            }
            None => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Path of the configuration file to load, if any
    pub fn locate(explicit: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            let path = expand_path(path)?;
            if !path.exists() {
                return Err(anyhow!("Configuration file not found: {:?}", path));
            }
            return Ok(Some(path));
        }

        if let Some(path) = LOCAL_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
        {
            return Ok(Some(path));
        }

        Ok(user_config_path().filter(|path| path.exists()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            controller: ControllerConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

/// `<config_dir>/orphanage/config.yaml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orphanage").join("config.yaml"))
}

/// Expand `~` and environment variables in a path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow!("Failed to expand path {}: {}", path, e))?;
    Ok(PathBuf::from(expanded.as_ref()))
}
