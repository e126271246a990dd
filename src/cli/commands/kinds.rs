//! Kinds command implementation

use anyhow::Result;
use clap::{ArgMatches, Command};
use orphanage_analyzer::MatcherRegistry;
use orphanage_cluster::TargetKind;

pub fn command() -> Command {
    Command::new("kinds").about("Show which kinds can reference which targets, and how")
}

pub async fn run(_matches: &ArgMatches) -> Result<()> {
    print!("{}", coverage_table(&MatcherRegistry::new()));
    Ok(())
}

/// One row per candidate kind, one column per target kind
pub fn coverage_table(registry: &MatcherRegistry) -> String {
    let width = registry
        .matchers()
        .map(|matcher| matcher.kind().label().len())
        .max()
        .unwrap_or_default();

    let mut table = format!("{:width$}", "KIND");
    for target in TargetKind::ALL {
        table.push_str(&format!("  {:>10}", target.label()));
    }
    table.push('\n');

    for matcher in registry.matchers() {
        table.push_str(&format!("{:width$}", matcher.kind().label()));
        for target in TargetKind::ALL {
            table.push_str(&format!("  {:>10}", matcher.support(target).to_string()));
        }
        table.push('\n');
    }

    table
}
