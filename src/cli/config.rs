//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::app::Settings;
use crate::store::TrashPolicy;

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root directory for the database and uploaded files
    pub data_dir: Option<PathBuf>,
    pub database: DatabaseConfig,
    pub upload: UploadConfig,
    pub trash: TrashConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("simplynote.db"),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_size_mb: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("files"),
            max_size_mb: 50,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrashConfig {
    pub enabled: bool,
    pub auto_empty_days: u32,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_empty_days: 30,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Self::config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/simplynote/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simplynote")
            .join("config.toml")
    }

    /// Resolve the data directory, with CLI argument taking precedence.
    ///
    /// Precedence order:
    /// 1. CLI `--data-dir` argument
    /// 2. Config file `data_dir` setting
    /// 3. Platform data directory (`~/.local/share/simplynote`)
    pub fn data_dir(&self, cli_dir: Option<&Path>) -> PathBuf {
        cli_dir
            .map(Path::to_path_buf)
            .or_else(|| self.data_dir.clone())
            .or_else(|| dirs::data_dir().map(|d| d.join("simplynote")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Store settings with relative paths resolved against the data directory.
    pub fn settings(&self, cli_dir: Option<&Path>) -> Settings {
        let data_dir = self.data_dir(cli_dir);
        Settings {
            db_path: data_dir.join(&self.database.path),
            upload_dir: data_dir.join(&self.upload.dir),
            max_upload_bytes: self.upload.max_size_mb.saturating_mul(1024 * 1024),
            trash: TrashPolicy::new(self.trash.enabled, self.trash.auto_empty_days),
        }
    }

    /// Log filter directive.
    ///
    /// Precedence order:
    /// 1. `-v` (debug) / `-vv` (trace)
    /// 2. Config file `logging.level`
    ///
    /// `RUST_LOG`, when set, overrides both at subscriber setup.
    pub fn log_level(&self, verbose: u8) -> &str {
        match verbose {
            0 => self.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    }
}
