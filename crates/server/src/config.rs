//! Server configuration.
//!
//! Built once at startup from environment variables, with CLI positional
//! directories taking precedence over `ALLOWED_DIRS`. The resulting
//! [`Config`] is immutable and injected into the server rather than read
//! from ambient globals, so tests can run several configurations side by
//! side.

use http::HeaderValue;
use std::path::PathBuf;
use thiserror::Error;

/// Default listen port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3030;

/// Immutable process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port (`PORT`).
    pub port: u16,
    /// Base directory for relative allowed dirs and request paths
    /// (`ROOT_DIR`, default the working directory).
    pub root_dir: PathBuf,
    /// Directories the server may access (CLI args or `ALLOWED_DIRS`).
    pub allowed_dirs: Vec<PathBuf>,
    /// Refuse all mutating operations (`READ_ONLY=true`).
    pub read_only: bool,
    /// Bearer token required on protected routes (`API_KEY`).
    pub api_key: Option<String>,
    /// Exact allowed CORS origin (`CORS_ORIGIN`); `None` means permissive.
    pub cors_origin: Option<HeaderValue>,
}

/// Errors from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no allowed directories configured")]
    NoAllowedDirs,
    #[error("invalid PORT value: {0}")]
    InvalidPort(String),
    #[error("invalid CORS_ORIGIN value: {0}")]
    InvalidCorsOrigin(String),
}

impl Config {
    /// Load configuration from the process environment; `cli_dirs`, when
    /// non-empty, overrides `ALLOWED_DIRS`.
    pub fn load(cli_dirs: Vec<PathBuf>) -> Result<Self, ConfigError> {
        Self::from_vars(cli_dirs, |key| std::env::var(key).ok())
    }

    fn from_vars(
        cli_dirs: Vec<PathBuf>,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let root_dir = get("ROOT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let allowed_dirs = if cli_dirs.is_empty() {
            get("ALLOWED_DIRS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default()
        } else {
            cli_dirs
        };
        if allowed_dirs.is_empty() {
            return Err(ConfigError::NoAllowedDirs);
        }

        let read_only = get("READ_ONLY").as_deref() == Some("true");
        let api_key = get("API_KEY").filter(|key| !key.is_empty());

        let cors_origin = match get("CORS_ORIGIN") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| ConfigError::InvalidCorsOrigin(raw.clone()))?,
            ),
            None => None,
        };

        Ok(Self {
            port,
            root_dir,
            allowed_dirs,
            read_only,
            api_key,
            cors_origin,
        })
    }
}
