//! Layered configuration.
//!
//! Settings are merged with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <FILE>`, or `config.toml` in the platform config
//!    directory (for example `~/.config/pardupes/config.toml`)
//! 3. `PARDUPES_*` environment variables (`PARDUPES_READ_CONCURRENCY=16`)
//! 4. Command-line flags
//!
//! ```toml
//! min_size = 4096
//! read_concurrency = 32
//! group_concurrency = 8
//! paranoid = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::pipeline::{PipelineConfig, DEFAULT_READ_CONCURRENCY};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PARDUPES_";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer holds a value of the wrong type or an unknown key.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Settings that can come from a file, the environment, or flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Smallest file size considered, in bytes
    pub min_size: u64,
    /// Simultaneous file reads
    pub read_concurrency: usize,
    /// Parallel directory readers during traversal
    pub traversal_concurrency: usize,
    /// Size groups compared at once; unset means the read concurrency
    pub group_concurrency: Option<usize>,
    /// Byte-for-byte confirmation of hash matches
    pub paranoid: bool,
    /// Move deleted duplicates to the trash
    pub trash: bool,
    /// Show progress bars
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_size: 1,
            read_concurrency: DEFAULT_READ_CONCURRENCY,
            traversal_concurrency: 1,
            group_concurrency: None,
            paranoid: false,
            trash: false,
            progress: false,
        }
    }
}

impl Config {
    /// Platform config file location, if a home directory can be found.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "pardupes", "pardupes")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the defaults < file < environment chain.
    ///
    /// A missing default file is skipped; a missing explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` does not exist.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match explicit {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => figment = figment.merge(Toml::file(path)),
            None => {
                if let Some(path) = Self::default_path() {
                    figment = figment.merge(Toml::file(path));
                }
            }
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load configuration from the file and environment layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a missing explicit file or invalid values.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(explicit)?.extract()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Apply command-line flags on top of the loaded layers.
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(min_size) = cli.min_size {
            self.min_size = min_size;
        }
        if let Some(n) = cli.read_concurrency {
            self.read_concurrency = usize::try_from(n).unwrap_or(usize::MAX);
        }
        if let Some(n) = cli.traversal_concurrency {
            self.traversal_concurrency = usize::try_from(n).unwrap_or(usize::MAX);
        }
        if let Some(n) = cli.group_concurrency {
            self.group_concurrency = Some(usize::try_from(n).unwrap_or(usize::MAX));
        }
        self.paranoid |= cli.paranoid;
        self.trash |= cli.trash;
        self.progress |= cli.progress;
        self
    }

    /// Pipeline settings for the given roots.
    #[must_use]
    pub fn pipeline_config(&self, roots: Vec<PathBuf>) -> PipelineConfig {
        PipelineConfig::new(roots)
            .with_min_size(self.min_size)
            .with_read_concurrency(self.read_concurrency)
            .with_traversal_concurrency(self.traversal_concurrency)
            .with_group_concurrency(self.group_concurrency)
            .with_paranoid(self.paranoid)
            .with_progress(self.progress)
    }
}
