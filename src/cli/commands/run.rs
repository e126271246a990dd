//! Run command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("run")
        .about("Run the controller against the current kube context")
        .arg(utils::config_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;

    info!(
        timeout_secs = config.controller.evaluation_timeout_secs,
        event_buffer = config.controller.event_buffer,
        "Starting orphanage controller"
    );

    utils::create_app(config).run_controller().await
}
