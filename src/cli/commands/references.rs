//! References command implementation

use crate::cli::utils;
use anyhow::Result;
use clap::{ArgMatches, Command};
use orphanage_analyzer::Target;
use orphanage_cluster::TargetKind;

pub fn command() -> Command {
    Command::new("references")
        .about("List every object that references one target")
        .arg(
            clap::Arg::new("kind")
                .short('k')
                .long("kind")
                .help("Target kind (Secret, ConfigMap, Service, Pod)")
                .value_name("KIND")
                .required(true),
        )
        .arg(
            clap::Arg::new("name")
                .long("name")
                .help("Target name")
                .value_name("NAME")
                .required(true),
        )
        .arg(
            clap::Arg::new("namespace")
                .short('n')
                .long("namespace")
                .help("Target namespace")
                .value_name("NAMESPACE")
                .default_value("default"),
        )
        .arg(utils::manifests_arg())
        .arg(utils::config_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;

    let kind: TargetKind = matches
        .get_one::<String>("kind")
        .map(String::as_str)
        .unwrap_or_default()
        .parse()?;
    let name = matches
        .get_one::<String>("name")
        .map(String::as_str)
        .unwrap_or_default();
    let namespace = matches
        .get_one::<String>("namespace")
        .map(String::as_str)
        .unwrap_or("default");
    let target = Target::new(kind, namespace, name);

    let state = utils::cluster_state(matches).await?;
    let references = utils::create_app(config).references(state, &target).await?;

    if references.is_empty() {
        println!("{} has no references", target);
        return Ok(());
    }

    println!("{} is referenced by:", target);
    for reference in references {
        println!("  {}", reference);
    }

    Ok(())
}
