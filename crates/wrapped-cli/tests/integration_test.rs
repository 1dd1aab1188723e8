//! Integration tests for wrapped-cli crate.
//!
//! Commands run end to end against a configuration file and an on-disk
//! archive in a temporary directory.

use clap::Parser;
use wrapped_cli::{run, Cli};
use wrapped_common::test_utils::{create_temp_dir, entry_fixtures::takeout_json, init_test_logging};
use wrapped_config::{Config, ConfigFormat, ConfigLoader};

fn config_in(dir: &std::path::Path) -> Config {
    let yaml = format!(
        "archive:\n  data_dir: \"{}\"\naggregation:\n  timezone_offset_hours: 0\n",
        dir.join("data").display()
    );
    ConfigLoader::parse(&yaml, ConfigFormat::Yaml).unwrap()
}

async fn execute(args: &[&str], config: &Config) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    run(cli.command, config, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_import_and_wrapped_json() {
    init_test_logging();
    let dir = create_temp_dir();
    let config = config_in(dir.path());
    let file = dir.path().join("watch-history.json");
    std::fs::write(&file, takeout_json()).unwrap();
    let file = file.to_string_lossy().into_owned();

    execute(&["yt-wrapped", "import", "--user", "alice", &file], &config).await;

    let printed = execute(
        &[
            "yt-wrapped", "wrapped", "--user", "alice", "--year", "2024", "--compare", "2023",
            "--pretty",
        ],
        &config,
    )
    .await;
    let json: serde_json::Value = serde_json::from_str(&printed).unwrap();

    assert_eq!(json["year"], 2024);
    assert_eq!(json["video_count"], 2);
    assert_eq!(json["comparison"]["previous_year"], 2023);
    assert!(json.get("placeholder").is_none());
    assert_eq!(json["hourly"].as_array().unwrap().len(), 24);
    assert_eq!(json["hourly"][8]["video_count"], 1);
}
