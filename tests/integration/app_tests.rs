use clap::Parser;
use pardupes::cli::Cli;
use pardupes::error::ExitCode;
use pardupes::pipeline::FinderError;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Parse arguments with an explicit config so the user's own file is never read.
fn cli(config: &Path, args: &[&str]) -> Cli {
    let config = config.to_string_lossy().into_owned();
    let mut argv = vec!["pardupes", "-q", "--config", config.as_str()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn split_records(bytes: &[u8]) -> Vec<String> {
    assert!(bytes.is_empty() || bytes.ends_with(b"\0"));
    bytes
        .split(|b| *b == 0)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| String::from_utf8(chunk.to_vec()).unwrap())
        .collect()
}

#[test]
fn test_app_writes_nul_pairs() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let config = base.join("config.toml");
    fs::write(&config, "").unwrap();
    let tree = base.join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("a1"), b"alpha").unwrap();
    fs::write(tree.join("a2"), b"alpha").unwrap();
    fs::write(tree.join("a3"), b"alpha").unwrap();
    let out = base.join("pairs.bin");

    let code = pardupes::run_app(cli(
        &config,
        &["--output", out.to_str().unwrap(), tree.to_str().unwrap()],
    ))
    .unwrap();
    assert_eq!(code, ExitCode::Success);

    let records = split_records(&fs::read(&out).unwrap());
    let a1 = tree.join("a1").to_string_lossy().into_owned();
    let a2 = tree.join("a2").to_string_lossy().into_owned();
    let a3 = tree.join("a3").to_string_lossy().into_owned();
    assert_eq!(records, vec![a1.clone(), a2, a1, a3]);
}

#[test]
fn test_app_zero_duplicates_is_success() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let config = base.join("config.toml");
    fs::write(&config, "").unwrap();
    let tree = base.join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("only"), b"one file").unwrap();
    let out = base.join("pairs.bin");

    let code = pardupes::run_app(cli(
        &config,
        &["--output", out.to_str().unwrap(), tree.to_str().unwrap()],
    ))
    .unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(fs::read(&out).unwrap().is_empty());
}

#[test]
fn test_app_json_report() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let config = base.join("config.toml");
    fs::write(&config, "").unwrap();
    let tree = base.join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("x"), b"json me").unwrap();
    fs::write(tree.join("y"), b"json me").unwrap();
    let out = base.join("report.json");

    pardupes::run_app(cli(
        &config,
        &["--json", "--output", out.to_str().unwrap(), tree.to_str().unwrap()],
    ))
    .unwrap();

    let report: serde_json::Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    assert_eq!(report["summary"]["duplicate_sets"], 1);
    assert_eq!(report["summary"]["duplicate_bytes"], 7);
    assert_eq!(report["summary"]["exit_code_name"], "PD000");
    let set = &report["duplicates"][0];
    assert!(set["original"].as_str().unwrap().ends_with("/x"));
    assert!(set["duplicates"][0].as_str().unwrap().ends_with("/y"));
}

#[test]
fn test_app_missing_root_produces_no_output() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let config = base.join("config.toml");
    fs::write(&config, "").unwrap();
    let out = base.join("pairs.bin");
    let missing = base.join("no-such-dir");

    let err = pardupes::run_app(cli(
        &config,
        &["--output", out.to_str().unwrap(), missing.to_str().unwrap()],
    ))
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::PathNotFound(_))
    ));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!out.exists());
}

#[test]
fn test_app_no_input() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let err = pardupes::run_app(cli(&config, &[])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FinderError>(),
        Some(FinderError::NoInput)
    ));
}

#[test]
fn test_app_min_size_from_config_file() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let config = base.join("config.toml");
    fs::write(&config, "min_size = 100\n").unwrap();
    let tree = base.join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("s1"), b"small").unwrap();
    fs::write(tree.join("s2"), b"small").unwrap();
    let out = base.join("pairs.bin");

    pardupes::run_app(cli(
        &config,
        &["--output", out.to_str().unwrap(), tree.to_str().unwrap()],
    ))
    .unwrap();
    assert!(fs::read(&out).unwrap().is_empty());

    // The flag wins over the file.
    pardupes::run_app(cli(
        &config,
        &["--min-size", "1", "--output", out.to_str().unwrap(), tree.to_str().unwrap()],
    ))
    .unwrap();
    assert_eq!(split_records(&fs::read(&out).unwrap()).len(), 2);
}

#[test]
fn test_app_delete_after_search() {
    let dir = tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    let config = base.join("config.toml");
    fs::write(&config, "").unwrap();
    let tree = base.join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("file1"), b"to be deduplicated").unwrap();
    fs::write(tree.join("file2"), b"to be deduplicated").unwrap();
    let out = base.join("pairs.bin");

    pardupes::run_app(cli(
        &config,
        &["--delete", "--output", out.to_str().unwrap(), tree.to_str().unwrap()],
    ))
    .unwrap();

    assert!(tree.join("file1").exists());
    assert!(!tree.join("file2").exists());
    assert_eq!(split_records(&fs::read(&out).unwrap()).len(), 2);
}

#[test]
fn test_app_missing_config_file() {
    let dir = tempdir().unwrap();
    let err = pardupes::run_app(cli(&dir.path().join("absent.toml"), &[dir.path().to_str().unwrap()]))
        .unwrap_err();
    assert!(format!("{:#}", err).contains("Config file not found"));
}
