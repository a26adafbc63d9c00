//! Centralized path management for subseek

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the subseek config directory
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("subseek");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Get the subseek data directory (not created here; the store creates it on open)
pub fn data_dir() -> PathBuf {
    data_root(dirs::data_dir(), dirs::home_dir()).join("subseek")
}

fn data_root(data: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    data.or_else(|| home.map(|home| home.join(".local").join("share")))
        .unwrap_or_else(std::env::temp_dir)
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("subseek.toml"))
}

pub fn default_database_file() -> PathBuf {
    data_dir().join("subseek.db")
}
