//! CLI command implementations

use anyhow::Result;
use clap::{ArgMatches, Command};

pub mod commands;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application
    pub fn app() -> Command {
        Command::new("orphanage")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Find Secrets and ConfigMaps that nothing in a namespace references")
            .subcommand(commands::run::command())
            .subcommand(commands::scan::command())
            .subcommand(commands::references::command())
            .subcommand(commands::kinds::command())
            .subcommand(commands::init::command())
    }

    /// Run the CLI application
    pub async fn run(matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("run", sub_matches)) => commands::run::run(sub_matches).await,
            Some(("scan", sub_matches)) => commands::scan::run(sub_matches).await,
            Some(("references", sub_matches)) => commands::references::run(sub_matches).await,
            Some(("kinds", sub_matches)) => commands::kinds::run(sub_matches).await,
            Some(("init", sub_matches)) => commands::init::run(sub_matches).await,
            _ => {
                // No subcommand provided, show help
                let _ = Self::app().print_help();
                Ok(())
            }
        }
    }
}

/// Common CLI utilities
pub mod utils {
    use anyhow::Result;
    use orphanage_cluster::ClusterState;
    use std::sync::Arc;

    use crate::config::expand_path;

    /// `--config FILE` argument shared by commands that read configuration
    pub fn config_arg() -> clap::Arg {
        clap::Arg::new("config")
            .short('c')
            .long("config")
            .help("Configuration file path")
            .value_name("FILE")
    }

    /// `--manifests DIR` argument selecting offline mode
    pub fn manifests_arg() -> clap::Arg {
        clap::Arg::new("manifests")
            .short('m')
            .long("manifests")
            .help("Read cluster state from YAML manifests instead of the current kube context")
            .value_name("DIR")
    }

    /// Load configuration from `--config` or the default locations
    pub fn load_config(matches: &clap::ArgMatches) -> Result<crate::Config> {
        let explicit = matches
            .try_get_one::<String>("config")
            .ok()
            .flatten()
            .map(String::as_str);
        crate::Config::resolve(explicit)
    }

    /// Create Orphanage instance
    pub fn create_app(config: crate::Config) -> crate::Orphanage {
        crate::Orphanage::new(config)
    }

    /// Cluster state selected by `--manifests` (and `--filter`), or the live
    /// cluster when no manifest directory is given. Manifests without a
    /// namespace land in `--namespace`.
    pub async fn cluster_state(matches: &clap::ArgMatches) -> Result<Arc<dyn ClusterState>> {
        match matches.get_one::<String>("manifests") {
            Some(dir) => {
                let filters: Vec<String> = matches
                    .try_get_many::<String>("filter")
                    .ok()
                    .flatten()
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default();
                let namespace = matches
                    .try_get_one::<String>("namespace")
                    .ok()
                    .flatten()
                    .map(String::as_str)
                    .unwrap_or("default");
                crate::Orphanage::manifest_state(&expand_path(dir)?, &filters, namespace)
            }
            None => crate::Orphanage::live_state().await,
        }
    }
}
