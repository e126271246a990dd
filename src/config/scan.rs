//! Offline scan configuration

use anyhow::Result;
use orphanage_cluster::TargetKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Settings for one-shot scans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Monitored kinds when a scan does not name any
    pub default_kinds: Vec<String>,

    /// Report format when a scan does not choose one
    pub output: OutputFormat,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        self.monitored_kinds().map(|_| ())
    }

    /// `default_kinds` parsed as monitorable target kinds
    pub fn monitored_kinds(&self) -> Result<Vec<TargetKind>> {
        Ok(self
            .default_kinds
            .iter()
            .map(|label| TargetKind::parse_monitored(label))
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            default_kinds: TargetKind::MONITORABLE
                .iter()
                .map(|kind| kind.label().to_string())
                .collect(),
            output: OutputFormat::Text,
        }
    }
}

/// How reports are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 3] = ["text", "yaml", "json"];
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "yaml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow::anyhow!("Unknown output format: {}", other)),
        }
    }
}
