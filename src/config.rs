use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;

/// Environment variable that overrides the configured database location.
pub const DATABASE_ENV: &str = "SUBSEEK_DATABASE_FILE";

fn default_player_program() -> String {
    "mpv".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Player executable, looked up on PATH
    #[serde(default = "default_player_program")]
    pub program: String,
    /// Extra arguments placed before the playback window options
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            program: default_player_program(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "paths::default_database_file")]
    pub database_file: PathBuf,
    #[serde(default)]
    pub player: PlayerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_file: paths::default_database_file(),
            player: PlayerConfig::default(),
        }
    }
}

impl Config {
    /// Load the config from the user config directory. If the file does not
    /// exist, a default config file is written and returned.
    pub fn load() -> Result<Config> {
        Self::load_from_path(&paths::config_file()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Config> {
        if !path.exists() {
            let default = Config::default();
            default.save_to_path(path)?;
            return Ok(default);
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let c: Config = toml::from_str(&s)
            .with_context(|| format!("parsing config toml {}", path.display()))?;
        Ok(c)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let toml = toml::to_string_pretty(self)
            .context("serializing config to toml")?;
        fs::write(path, toml)
            .with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }

    /// Database location for this invocation: flag, then environment, then config.
    pub fn database_path(&self, flag: Option<&Path>) -> PathBuf {
        select_database(flag, std::env::var_os(DATABASE_ENV), &self.database_file)
    }
}

fn select_database(flag: Option<&Path>, env: Option<OsString>, configured: &Path) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match env {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => configured.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf").join("subseek.toml");

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.player.program, "mpv");
        assert!(path.exists());

        let reloaded = Config::load_from_path(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subseek.toml");
        fs::write(&path, "database_file = \"/tmp/lines.db\"\n")
            .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.database_file, PathBuf::from("/tmp/lines.db"));
        assert_eq!(config.player, PlayerConfig::default());
    }

    #[test]
    fn player_section_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subseek.toml");
        fs::write(
            &path,
            "[player]\nprogram = \"vlc\"\nextra_args = [\"--fullscreen\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.player.program, "vlc");
        assert_eq!(config.player.extra_args, vec!["--fullscreen".to_string()]);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subseek.toml");
        fs::write(&path, "database_file = [").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }

    #[test]
    fn database_precedence() {
        let configured = Path::new("/config.db");
        assert_eq!(
            select_database(
                Some(Path::new("/flag.db")),
                Some("/env.db".into()),
                configured
            ),
            PathBuf::from("/flag.db")
        );
        assert_eq!(
            select_database(None, Some("/env.db".into()), configured),
            PathBuf::from("/env.db")
        );
        assert_eq!(
            select_database(None, Some("".into()), configured),
            PathBuf::from("/config.db")
        );
        assert_eq!(
            select_database(None, None, configured),
            PathBuf::from("/config.db")
        );
    }

    #[test]
    #[serial]
    fn database_env_is_honoured() {
        let config = Config {
            database_file: PathBuf::from("/config.db"),
            player: PlayerConfig::default(),
        };
        unsafe { std::env::set_var(DATABASE_ENV, "/from-env.db") };
        let resolved = config.database_path(None);
        unsafe { std::env::remove_var(DATABASE_ENV) };
        assert_eq!(resolved, PathBuf::from("/from-env.db"));
    }
}
