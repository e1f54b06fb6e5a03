//! Service configuration.
//!
//! Settings live in a YAML file whose path comes from `--config` or the
//! `CONFIG_PATH` environment variable:
//!
//! ```yaml
//! env: local
//! storage_path: storage/storage.db
//! http_server:
//!   address: localhost:8082
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "students-api", version, about = "Student records over HTTP")]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    pub config: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Config {
    /// Deployment environment name, only reported in logs.
    #[serde(default = "default_env")]
    pub env: String,
    pub storage_path: PathBuf,
    pub http_server: HttpServer,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct HttpServer {
    /// `host:port`; host names are resolved at bind time.
    pub address: String,
}

fn default_env() -> String {
    "production".to_owned()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_yaml::Error },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_owned(), source })?;
        let config: Config = serde_yaml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_owned(), source })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.storage_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty("storage_path"));
        }
        if self.http_server.address.trim().is_empty() {
            return Err(ConfigError::Empty("http_server.address"));
        }
        Ok(())
    }
}
