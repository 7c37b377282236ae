use clap::Parser;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use pardupes::cli::Cli;
use pardupes::config::Config;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Without Env so other tests' variables cannot interfere
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.read_concurrency, 4);
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
min_size = 1048576
read_concurrency = 24
traversal_concurrency = 3
progress = true
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();
    assert_eq!(config.min_size, 1_048_576);
    assert_eq!(config.read_concurrency, 24);
    assert_eq!(config.traversal_concurrency, 3);
    assert!(config.progress);
    assert_eq!(config.group_concurrency, None);
}

#[test]
fn test_config_env_layer() {
    std::env::set_var("PDTEST_GROUP_CONCURRENCY", "6");
    let config: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("PDTEST_"))
        .extract();
    std::env::remove_var("PDTEST_GROUP_CONCURRENCY");

    assert_eq!(config.unwrap().group_concurrency, Some(6));
}

#[test]
fn test_config_then_cli_precedence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 500\nread_concurrency = 24\n").unwrap();

    let file_config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();
    let cli = Cli::try_parse_from(["pardupes", "--min-size", "1KiB", "/data"]).unwrap();
    let config = file_config.with_cli_overrides(&cli);

    assert_eq!(config.min_size, 1024);
    assert_eq!(config.read_concurrency, 24);

    let pipeline = config.pipeline_config(cli.paths.clone());
    assert_eq!(pipeline.roots, vec![PathBuf::from("/data")]);
    assert_eq!(pipeline.min_size, 1024);
    assert_eq!(pipeline.effective_group_concurrency(), 24);
}

#[test]
fn test_config_invalid_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "read_concurrency = \"lots\"\n").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract();
    assert!(result.is_err());
}
