//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config <FILE>`, or `config.toml` in the platform config
//!    directory (e.g. `~/.config/dupedirs/config.toml`)
//! 3. `DUPEDIRS_*` environment variables (`DUPEDIRS_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! ```toml
//! chunk_size = 1048576
//! io_threads = 8
//! follow_symlinks = false
//! skip_hidden = true
//! output = "json"
//! report = "/tmp/dupes.json"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::{Cli, OutputFormat};
use crate::duplicates::FinderConfig;
use crate::scanner::{WalkerConfig, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "DUPEDIRS_";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or holds a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read buffer size for fingerprinting, in bytes.
    pub chunk_size: u64,
    /// Number of fingerprinting threads.
    pub io_threads: usize,
    /// Descend into symlinked directories.
    pub follow_symlinks: bool,
    /// Skip entries whose name starts with `.`.
    pub skip_hidden: bool,
    /// Report format.
    pub output: OutputFormat,
    /// Report file; defaults to a name derived from `output`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_BUFFER_SIZE as u64,
            io_threads: 4,
            follow_symlinks: false,
            skip_hidden: false,
            output: OutputFormat::Csv,
            report: None,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// With `explicit` set, that file must exist; otherwise the platform
    /// default file is used if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing or any layer
    /// fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let figment = Self::figment(explicit)?;
        let config: Self = figment.extract().map_err(Box::new)?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` names a missing file.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                log::debug!("Using config file {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path().filter(|p| p.is_file()) {
                    log::debug!("Using config file {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Platform-specific default configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupedirs", "dupedirs")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the loaded layers.
    #[must_use]
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(size) = cli.chunk_size {
            self.chunk_size = size;
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if let Some(output) = cli.output {
            self.output = output;
        }
        if let Some(ref report) = cli.report {
            self.report = Some(report.clone());
        }
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
        self
    }

    /// Report file to write.
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.output.default_report_name()))
    }

    /// Finder settings derived from this configuration.
    ///
    /// A `chunk_size` above [`MAX_BUFFER_SIZE`] is capped.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        let chunk_size = usize::try_from(self.chunk_size).unwrap_or(usize::MAX);
        if chunk_size > MAX_BUFFER_SIZE {
            log::warn!(
                "chunk_size {} exceeds the {} byte limit, using the limit",
                self.chunk_size,
                MAX_BUFFER_SIZE
            );
        }
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_buffer_size(chunk_size)
            .with_walker_config(WalkerConfig::new(self.follow_symlinks, self.skip_hidden))
    }
}
