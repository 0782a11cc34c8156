use std::env;
use std::path::{Path, PathBuf};

/// Database configuration.
///
/// Reads from the `STUDIO_DATABASE_URL` environment variable, falling back to
/// `sqlite://data/art_studio.db` when unset.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full SQLite connection URL.
    pub database_url: String,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "sqlite://data/art_studio.db";

    /// Environment variable holding the connection URL.
    pub const URL_ENV: &str = "STUDIO_DATABASE_URL";

    /// Build a config from the environment.
    ///
    /// Priority: `STUDIO_DATABASE_URL` env var, then the compile-time default.
    pub fn from_env() -> Self {
        let database_url = env::var(Self::URL_ENV)
            .unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        Self { database_url }
    }

    /// Build a config from an explicit URL (useful for tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Build a config pointing at a database file.
    pub fn for_file(path: &Path) -> Self {
        Self::new(format!("sqlite://{}", path.display()))
    }

    /// Filesystem path of the database file.
    ///
    /// Returns `None` for in-memory databases or URLs without a path.
    pub fn database_path(&self) -> Option<PathBuf> {
        let rest = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        // Drop connection parameters such as `?mode=rwc`.
        let path = rest.split('?').next().unwrap_or_default();
        if path.is_empty() || path == ":memory:" {
            return None;
        }
        Some(PathBuf::from(path))
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
