//! User settings loaded from an optional TOML file.
//!
//! Every key is optional so a missing file, or a file with only some keys,
//! still produces a usable configuration:
//!
//! ```toml
//! database_path = "/home/me/contacts.sqlite"
//! log_filter = "debug"
//! log_dir = "/tmp/rp-contacts-logs"
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use crate::db::default_database_path;

/// Environment variable that points at an alternative settings file.
pub const CONFIG_ENV_VAR: &str = "RP_CONTACTS_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Override for the SQLite file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from `$RP_CONTACTS_CONFIG`, falling back to `config.toml` in the
    /// platform config directory. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = match env::var_os(CONFIG_ENV_VAR) {
            Some(path) => PathBuf::from(path),
            None => default_config_path()?,
        };
        Ok(Self::load_from(&path)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => default_database_path(),
        }
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        match &self.log_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().join("logs")),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "rp-contacts").ok_or_else(|| anyhow!("could not locate home directory"))
}

fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}
