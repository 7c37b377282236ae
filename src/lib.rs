//! pardupes - parallel duplicate file finder.
//!
//! Built for trees with millions of files or high-latency mounts. Files are
//! grouped by size during a metadata-only traversal, then each size group is
//! compared by sampled content fingerprint and full hash, with group-level and
//! read-level concurrency bounded by separate pools.

pub mod actions;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;

use crate::actions::{delete_duplicates, DeleteConfig};
use crate::cli::Cli;
use crate::config::Config;
use crate::duplicates::DuplicateSet;
use crate::error::ExitCode;
use crate::output::{summary_lines, JsonOutput, PairsOutput};
use crate::pipeline::{Pipeline, ScanSummary};

/// Run a search from parsed command-line arguments.
///
/// Results are written before any deletion so a failed write never leaves
/// files deleted without a record.
///
/// # Errors
///
/// Returns an error for invalid configuration, a fatal run error
/// ([`pipeline::FinderError`]), or a failure writing results.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_cli_overrides(&cli);

    let handler = signal::install_handler();
    let pipeline_config = config
        .pipeline_config(cli.paths.clone())
        .with_checkpoint(cli.traversal_checkpoint.clone(), cli.require_checkpoint)
        .with_shutdown_flag(handler.get_flag());

    let (sets, summary) = Pipeline::new(pipeline_config).run()?;

    write_results(&cli, &sets, &summary)?;
    for line in summary_lines(&summary) {
        log::info!("{}", line);
    }

    if cli.delete {
        let result = delete_duplicates(&sets, &DeleteConfig { trash: config.trash });
        if !result.all_succeeded() {
            log::warn!("{} duplicate(s) could not be deleted", result.failure_count());
        }
    }

    Ok(ExitCode::Success)
}

fn write_results(cli: &Cli, sets: &[DuplicateSet], summary: &ScanSummary) -> anyhow::Result<()> {
    if cli.writes_to_stdout() {
        let stdout = io::stdout();
        let mut writer = BufWriter::new(stdout.lock());
        write_to(cli.json, sets, summary, &mut writer).context("Failed to write results to stdout")
    } else {
        let file = File::create(&cli.output)
            .with_context(|| format!("Failed to create {}", cli.output.display()))?;
        let mut writer = BufWriter::new(file);
        write_to(cli.json, sets, summary, &mut writer)
            .with_context(|| format!("Failed to write {}", cli.output.display()))?;
        log::info!("Results written to {}", cli.output.display());
        Ok(())
    }
}

fn write_to<W: Write>(
    json: bool,
    sets: &[DuplicateSet],
    summary: &ScanSummary,
    writer: &mut W,
) -> anyhow::Result<()> {
    if json {
        JsonOutput::new(sets, summary, ExitCode::Success).write_to(writer, true)?;
    } else {
        PairsOutput::new(sets).write_to(writer)?;
    }
    Ok(())
}
