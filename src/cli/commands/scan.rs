//! Scan command implementation

use crate::cli::utils;
use crate::OutputFormat;
use anyhow::Result;
use clap::{ArgMatches, Command};
use orphanage_analyzer::OrphanReport;
use orphanage_cluster::TargetKind;
use std::fmt::Write;

pub fn command() -> Command {
    Command::new("scan")
        .about("Evaluate one namespace once and print its orphans")
        .arg(
            clap::Arg::new("namespace")
                .short('n')
                .long("namespace")
                .help("Namespace to evaluate")
                .value_name("NAMESPACE")
                .default_value("default"),
        )
        .arg(utils::manifests_arg())
        .arg(
            clap::Arg::new("filter")
                .long("filter")
                .help("Only load manifest files matching this glob (repeatable)")
                .value_name("GLOB")
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::Arg::new("kinds")
                .short('k')
                .long("kinds")
                .help("Comma-separated kinds to monitor (Secret, ConfigMap)")
                .value_name("KINDS")
                .value_delimiter(','),
        )
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Output format")
                .value_name("FORMAT")
                .value_parser(OutputFormat::NAMES),
        )
        .arg(utils::config_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let config = utils::load_config(matches)?;

    let kinds = match matches.get_many::<String>("kinds") {
        Some(labels) => labels
            .map(|label| TargetKind::parse_monitored(label.trim()))
            .collect::<Result<Vec<_>, _>>()?,
        None => config.scan.monitored_kinds()?,
    };
    let output = match matches.get_one::<String>("output") {
        Some(format) => format.parse()?,
        None => config.scan.output,
    };
    let namespace = matches
        .get_one::<String>("namespace")
        .map(String::as_str)
        .unwrap_or("default");

    let state = utils::cluster_state(matches).await?;
    let app = utils::create_app(config);
    let report = app.scan(state, namespace, &kinds).await?;

    print!("{}", render(&report, output)?);
    Ok(())
}

/// Render a report in the chosen format
pub fn render(report: &OrphanReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(report)?),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(report)?)),
        OutputFormat::Text => {
            let mut text = String::new();
            writeln!(
                text,
                "Namespace {}: {} orphan(s) among {} target(s)",
                report.namespace, report.orphan_count, report.targets_evaluated
            )?;
            for orphan in &report.orphans {
                writeln!(text, "  {}", orphan)?;
            }
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orphanage_analyzer::Orphan;
    use rstest::rstest;

    fn report() -> OrphanReport {
        OrphanReport::new(
            "prod",
            3,
            vec![Orphan {
                kind: TargetKind::Secret,
                name: "stale-token".to_string(),
            }],
        )
    }

    #[test]
    fn test_render_text() {
        let text = render(&report(), OutputFormat::Text).unwrap();
        assert_eq!(
            text,
            "Namespace prod: 1 orphan(s) among 3 target(s)\n  Secret/stale-token\n"
        );
    }

    #[rstest]
    #[case(OutputFormat::Yaml, "orphanCount: 1")]
    #[case(OutputFormat::Json, "\"orphanCount\": 1")]
    fn test_render_structured(#[case] format: OutputFormat, #[case] expected: &str) {
        let rendered = render(&report(), format).unwrap();
        assert!(rendered.contains(expected), "{rendered}");
        assert!(rendered.contains("stale-token"));
    }

    #[test]
    fn test_command_parses_kind_list() {
        let matches = command()
            .try_get_matches_from(["scan", "--kinds", "Secret,ConfigMap", "-o", "json"])
            .unwrap();
        let kinds: Vec<_> = matches.get_many::<String>("kinds").unwrap().collect();
        assert_eq!(kinds, ["Secret", "ConfigMap"]);
        assert_eq!(matches.get_one::<String>("namespace").unwrap(), "default");
    }

    #[test]
    fn test_command_rejects_unknown_output() {
        assert!(command()
            .try_get_matches_from(["scan", "-o", "xml"])
            .is_err());
    }
}
