//! Init command implementation

use crate::config::expand_path;
use crate::Config;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::path::Path;
use tracing::info;

pub fn command() -> Command {
    Command::new("init")
        .about("Write a default configuration file")
        .arg(
            clap::Arg::new("path")
                .short('p')
                .long("path")
                .help("Output file path")
                .value_name("FILE")
                .default_value(".orphanage.yaml"),
        )
        .arg(
            clap::Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing file")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or(".orphanage.yaml");
    let path = expand_path(path)?;

    write_default_config(&path, matches.get_flag("force"))?;

    println!("Configuration file created: {}", path.display());
    println!("Edit it to tune the controller and scan defaults.");

    Ok(())
}

/// Write the default configuration to `path`, refusing to replace an
/// existing file unless `force` is set
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{:?} already exists, use --force to overwrite it",
            path
        ));
    }

    info!("Initializing configuration file: {:?}", path);
    Config::default().save_to_file(path)
}
