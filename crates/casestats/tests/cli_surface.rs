use std::path::Path;

use casestats::cli::app::{Cli, Command};
use casestats::cli::commands::schema::SchemaTarget;
use clap::Parser;

#[test]
fn parses_global_runtime_flags_for_query() {
    let cli = Cli::parse_from([
        "casestats",
        "--home-dir",
        "/home/counselor",
        "--cwd",
        "/srv/app",
        "--db",
        "data/cases.sqlite",
        "query",
        "--record-type",
        "Consultation",
        "--group-by",
        "type",
        "--filter",
        "status=occurred",
        "--filter",
        "scheduled_at__year=2024",
    ]);

    assert_eq!(
        cli.runtime.home_dir.as_deref(),
        Some(Path::new("/home/counselor"))
    );
    assert_eq!(cli.runtime.cwd.as_deref(), Some(Path::new("/srv/app")));
    assert_eq!(cli.runtime.db.as_deref(), Some(Path::new("data/cases.sqlite")));

    match cli.command {
        Command::Query(args) => {
            assert_eq!(args.record_type.as_deref(), Some("Consultation"));
            assert_eq!(args.group_by.as_deref(), Some("type"));
            assert_eq!(
                args.filters,
                vec![
                    ("status".to_string(), "occurred".to_string()),
                    ("scheduled_at__year".to_string(), "2024".to_string()),
                ]
            );
        }
        other => panic!("expected query command, got {other:?}"),
    }
}

#[test]
fn query_requires_record_type_or_request() {
    assert!(Cli::try_parse_from(["casestats", "query"]).is_err());
    assert!(Cli::try_parse_from(["casestats", "query", "--request", "{}"]).is_ok());
    assert!(
        Cli::try_parse_from([
            "casestats",
            "query",
            "--request",
            "{}",
            "--record-type",
            "Case"
        ])
        .is_err()
    );
}

#[test]
fn parses_report_period_facets_and_hidden_sections() {
    let cli = Cli::parse_from([
        "casestats",
        "report",
        "--from",
        "2024-01-01",
        "--to",
        "2024-12-31",
        "--facet",
        "consultation_type=phone",
        "--hide",
        "funding",
        "--snapshot",
        "out/report.json",
    ]);

    match cli.command {
        Command::Report(args) => {
            assert_eq!(args.from.as_deref(), Some("2024-01-01"));
            assert_eq!(args.to.as_deref(), Some("2024-12-31"));
            assert_eq!(
                args.facets,
                vec![("consultation_type".to_string(), "phone".to_string())]
            );
            assert_eq!(args.hide, vec!["funding".to_string()]);
            assert_eq!(args.snapshot.as_deref(), Some(Path::new("out/report.json")));
        }
        other => panic!("expected report command, got {other:?}"),
    }
}

#[test]
fn parses_metadata_record_types_and_schema_target() {
    let cli = Cli::parse_from([
        "casestats",
        "metadata",
        "--record-type",
        "Case",
        "--record-type",
        "Client",
    ]);
    match cli.command {
        Command::Metadata(args) => assert_eq!(args.record_types, vec!["Case", "Client"]),
        other => panic!("expected metadata command, got {other:?}"),
    }

    let cli = Cli::parse_from(["casestats", "schema", "report"]);
    match cli.command {
        Command::Schema(args) => assert_eq!(args.target, SchemaTarget::Report),
        other => panic!("expected schema command, got {other:?}"),
    }
}

#[test]
fn malformed_key_value_flags_are_usage_errors() {
    assert!(
        Cli::try_parse_from([
            "casestats",
            "query",
            "--record-type",
            "Case",
            "--filter",
            "status"
        ])
        .is_err()
    );
}
