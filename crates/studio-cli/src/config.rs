//! Configuration file management for the studio.
//!
//! Provides a TOML config file at `~/.config/art-studio/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use studio_db::config::DbConfig;

pub const DATA_DIR_ENV: &str = "STUDIO_DATA_DIR";
pub const AGENT_URL_ENV: &str = "STUDIO_AGENT_URL";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8283";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub agent: AgentSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Root for uploads, portfolio images and exported projects.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AgentSection {
    /// Base URL of the Letta server.
    pub base_url: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/art-studio` or `~/.config/art-studio`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("art-studio");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("art-studio")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Write the config file, creating parent dirs as needed. Mode 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StudioConfig {
    pub db_config: DbConfig,
    pub data_dir: PathBuf,
    pub agent_url: String,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

impl StudioConfig {
    /// Resolve each setting as CLI flag > env var > config file > default.
    ///
    /// - database URL: `STUDIO_DATABASE_URL`, `[database] url`, `DbConfig::DEFAULT_URL`
    /// - data dir: `STUDIO_DATA_DIR`, `[storage] data_dir`, `data`
    /// - agent URL: `STUDIO_AGENT_URL`, `[agent] base_url`, `http://localhost:8283`
    pub fn resolve(cli_db_url: Option<&str>, cli_data_dir: Option<&str>) -> Self {
        let file = load_config().unwrap_or_default();

        let db_url = cli_db_url
            .map(str::to_string)
            .or_else(|| env_var(DbConfig::URL_ENV))
            .or(file.database.url)
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_string());

        let data_dir = cli_data_dir
            .map(PathBuf::from)
            .or_else(|| env_var(DATA_DIR_ENV).map(PathBuf::from))
            .or(file.storage.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let agent_url = env_var(AGENT_URL_ENV)
            .or(file.agent.base_url)
            .unwrap_or_else(|| DEFAULT_AGENT_URL.to_string());

        Self {
            db_config: DbConfig::new(db_url),
            data_dir,
            agent_url,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
