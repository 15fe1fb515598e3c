use std::fs;

use clap::Parser;
use nimbus::app::{build_store, execute, Cli, Commands, LogFormatArg, OutputFormat};
use nimbus_observability::LogFormat;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("nimbus-config").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_parse_global_flags() {
    let cli = parse(&["show", "--format", "toml", "-p", "us-west-1", "-p", "legacy-ami"]);
    assert_eq!(cli.profiles, vec!["us-west-1", "legacy-ami"]);
    assert_eq!(cli.log_level, "warn");
    assert_eq!(cli.log_format, LogFormatArg::Compact);
    assert!(matches!(
        cli.command,
        Commands::Show {
            format: OutputFormat::Toml
        }
    ));

    let cli = parse(&["show", "--log-format", "json"]);
    assert_eq!(cli.log_format, LogFormatArg::Json);
    assert_eq!(LogFormat::from(cli.log_format), LogFormat::Json);
    assert_eq!(
        LogFormat::from(parse(&["validate", "--log-format", "pretty"]).log_format),
        LogFormat::Pretty
    );

    assert!(Cli::try_parse_from(["nimbus-config", "show", "--log-format", "xml"]).is_err());
    assert!(Cli::try_parse_from(["nimbus-config", "get"]).is_err());
}

#[test]
fn test_get_command() {
    assert_eq!(execute(&parse(&["get", "FIRST_PORT"])).unwrap(), "5800");
    assert_eq!(execute(&parse(&["get", "INSTANCE_NUM"])).unwrap(), "0");
    assert_eq!(
        execute(&parse(&["get", "PLACEMENT_GROUP"])).unwrap(),
        "nimbus-cluster"
    );
    assert_eq!(
        execute(&parse(&["get", "PLACEMENT_GROUP", "--json"])).unwrap(),
        "\"nimbus-cluster\""
    );
    assert_eq!(
        execute(&parse(&["get", "PLACEMENT", "-p", "us-west-1"])).unwrap(),
        "null"
    );
    assert!(execute(&parse(&["get", "NONEXISTENT_KEY"])).is_err());
}

#[test]
fn test_show_formats() {
    let json = execute(&parse(&["show"])).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["FIRST_PORT"], 5800);
    assert_eq!(value["INSTANCE_NUM"], 0);
    assert_eq!(value["LB_PERIOD"], 60);

    let toml = execute(&parse(&["show", "--format", "toml", "-p", "us-west-1"])).unwrap();
    assert!(toml.contains("EC2_LOCATION = \"us-west-1\""));
    assert!(toml.contains("disabled = ["));

    let sections = execute(&parse(&["show", "--format", "sections"])).unwrap();
    let value: serde_json::Value = serde_json::from_str(&sections).unwrap();
    assert_eq!(value["deployment"]["region"], "us-west-2");
    assert_eq!(value["controller"]["first_port"], 5800);
}

#[test]
fn test_validate_command() {
    let output = execute(&parse(&["validate"])).unwrap();
    assert!(output.contains("us-west-2"));

    for profile in ["us-west-1", "physbam-layout", "legacy-ami"] {
        assert!(execute(&parse(&["validate", "-p", profile])).is_ok());
    }
}

#[test]
fn test_profiles_command() {
    let output = execute(&parse(&["profiles"])).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().any(|line| line.starts_with("* us-west-2")));
    assert!(output.contains("physbam-layout"));
}

#[test]
fn test_unknown_profile() {
    let err = execute(&parse(&["show", "-p", "eu-central-1"])).unwrap_err();
    assert!(format!("{err:#}").contains("eu-central-1"));
}

#[test]
fn test_overlay_flag() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("run.toml");
    fs::write(&path, "CONTROLLER_NUM = 1\nWORKER_NUM = 8\n").unwrap();

    let cli = parse(&["get", "INSTANCE_NUM", "-o", path.to_str().unwrap()]);
    assert_eq!(execute(&cli).unwrap(), "9");

    let store = build_store(&cli).unwrap();
    assert_eq!(store.get::<u32>("WORKER_NUM").unwrap(), 8);
}

#[test]
fn test_overlay_conflicting_derived_value() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("conflict.toml");
    fs::write(&path, "WORKER_NUM = 8\nINSTANCE_NUM = 3\n").unwrap();

    let cli = parse(&["validate", "-o", path.to_str().unwrap()]);
    let err = execute(&cli).unwrap_err();
    assert!(format!("{err:#}").contains("INSTANCE_NUM"));
}

#[test]
fn test_overlay_type_error_reported_as_build_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("typed.toml");
    fs::write(&path, "FIRST_PORT = \"5800\"\n").unwrap();

    let cli = parse(&["show", "-o", path.to_str().unwrap()]);
    let err = execute(&cli).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("构建配置失败"));
    assert!(message.contains("FIRST_PORT"));
}
