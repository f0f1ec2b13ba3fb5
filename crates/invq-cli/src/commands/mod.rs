//! Subcommand implementations.

pub mod ask;
pub mod batch;
pub mod chat;
pub mod config;
pub mod merge;
pub mod output;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;

use invq_core::models::config::InvqConfig;

/// Location of the user's config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invq")
        .join("config.json")
}

/// Load the config named by `--config`, else the user's config file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvqConfig> {
    if let Some(path) = config_path {
        return Ok(InvqConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config from {}", default_path.display());
        Ok(InvqConfig::from_file(&default_path)?)
    } else {
        Ok(InvqConfig::default())
    }
}
