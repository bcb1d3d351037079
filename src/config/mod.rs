//! Application configuration

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::{CatalogError, ResponseCatalog};

const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// TOML file replacing the built-in response catalog
    pub catalog_path: Option<PathBuf>,
    /// Seed for reproducible reply selection
    pub rng_seed: Option<u64>,
    /// Sessions with no activity for this long are dropped
    pub session_idle_secs: u64,
    /// Upper bound on live sessions
    pub max_sessions: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            catalog_path: env::var("AGENTX_CATALOG_PATH").ok().map(PathBuf::from),
            rng_seed: env::var("AGENTX_RNG_SEED")
                .ok()
                .map(|s| s.parse::<u64>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("AGENTX_RNG_SEED must be an unsigned integer: {}", e))?,
            session_idle_secs: env::var("AGENTX_SESSION_IDLE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SESSION_IDLE_SECS),
            max_sessions: env::var("AGENTX_MAX_SESSIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_SESSIONS),
        })
    }

    /// "file" when a catalog path is configured, otherwise "builtin"
    pub fn catalog_source(&self) -> &'static str {
        if self.catalog_path.is_some() {
            "file"
        } else {
            "builtin"
        }
    }

    /// The configured catalog, or the built-in one
    pub fn load_catalog(&self) -> Result<ResponseCatalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => ResponseCatalog::from_file(path),
            None => Ok(ResponseCatalog::default()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            catalog_path: None,
            rng_seed: None,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_builtin_catalog() {
        let config = Config::default();
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.greeting, crate::core::catalog::builtin::GREETING);
        assert_eq!(config.catalog_source(), "builtin");
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = Config {
            catalog_path: Some(PathBuf::from("/nonexistent/agentx/catalog.toml")),
            ..Config::default()
        };
        assert!(matches!(config.load_catalog(), Err(CatalogError::Io(_))));
        assert_eq!(config.catalog_source(), "file");
    }
}
