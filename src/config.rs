//! Server configuration.
//!
//! Everything is read from environment variables with sensible defaults, so a
//! bare `zeroblock-server` starts a local instance backed by a SQLite file in
//! the system temp directory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, ServerError};

pub const ENV_STORAGE_PATH: &str = "ZEROBLOCK_STORAGE_PATH";
pub const ENV_BIND: &str = "ZEROBLOCK_BIND";
pub const ENV_ADMIN_USER: &str = "ZEROBLOCK_ADMIN_USER";
pub const ENV_ADMIN_PASSWORD: &str = "ZEROBLOCK_ADMIN_PASSWORD";
pub const ENV_TOKEN_TTL_HOURS: &str = "ZEROBLOCK_TOKEN_TTL_HOURS";

const DB_FILE_NAME: &str = "zeroblock.db";

/// Credentials for the account created on first start
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the SQLite database
    pub storage_path: PathBuf,
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,
    pub admin: BootstrapAdmin,
    /// Lifetime of login tokens
    pub token_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            storage_path: std::env::temp_dir().join("zeroblock-storage"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            admin: BootstrapAdmin {
                username: "admin".to_string(),
                password: "admin".to_string(),
            },
            token_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_STORAGE_PATH) {
            config.storage_path = PathBuf::from(path);
        }

        if let Some(bind) = lookup(ENV_BIND) {
            config.bind_addr = bind.parse().map_err(|_| {
                ServerError::Config(format!("{} is not a socket address: {}", ENV_BIND, bind))
            })?;
        }

        if let Some(username) = lookup(ENV_ADMIN_USER) {
            if username.trim().is_empty() {
                return Err(ServerError::Config(format!(
                    "{} must not be empty",
                    ENV_ADMIN_USER
                )));
            }
            config.admin.username = username;
        }
        if let Some(password) = lookup(ENV_ADMIN_PASSWORD) {
            config.admin.password = password;
        }

        if let Some(hours) = lookup(ENV_TOKEN_TTL_HOURS) {
            let hours: u64 = hours.parse().map_err(|_| {
                ServerError::Config(format!(
                    "{} must be a whole number of hours: {}",
                    ENV_TOKEN_TTL_HOURS, hours
                ))
            })?;
            let secs = hours
                .checked_mul(60 * 60)
                .filter(|secs| i64::try_from(*secs).is_ok())
                .ok_or_else(|| {
                    ServerError::Config(format!("{} is too large: {}", ENV_TOKEN_TTL_HOURS, hours))
                })?;
            config.token_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.storage_path.join(DB_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.token_ttl, Duration::from_secs(86400));
        assert!(config.database_path().ends_with("zeroblock.db"));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            (ENV_STORAGE_PATH, "/srv/zeroblock"),
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_ADMIN_USER, "root"),
            (ENV_TOKEN_TTL_HOURS, "2"),
        ]))
        .unwrap();

        assert_eq!(config.database_path(), PathBuf::from("/srv/zeroblock/zeroblock.db"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.admin.username, "root");
        assert_eq!(config.token_ttl, Duration::from_secs(7200));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(ServerConfig::from_lookup(lookup_from(&[(ENV_BIND, "not-an-addr")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[(ENV_TOKEN_TTL_HOURS, "soon")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[(ENV_ADMIN_USER, "  ")])).is_err());
    }

    #[test]
    fn test_huge_token_ttl_is_a_config_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[(ENV_TOKEN_TTL_HOURS, "6000000000000000")]))
            .unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));

        // Fits u64 seconds but not a signed timestamp
        let err = ServerConfig::from_lookup(lookup_from(&[(ENV_TOKEN_TTL_HOURS, "3000000000000000")]))
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}
