//! Server configuration loaded from environment variables.
//!
//! Every key has a default, so an empty environment starts an in-memory
//! kiosk on `0.0.0.0:8080`. Setting `DATABASE_URL` switches to PostgreSQL.

use kiosk_runtime::AdminSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{key}={value:?} is not a valid {expected}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// What the value should have been
        expected: &'static str,
    },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server
    pub server: ServerConfig,
    /// Optional PostgreSQL store
    pub database: DatabaseConfig,
    /// Admin credentials
    pub admin: AdminConfig,
    /// Payment confirmation
    pub payment: PaymentConfig,
    /// Demo data
    pub seed: SeedConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; `None` selects the in-memory store
    pub url: Option<String>,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
}

/// Admin configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin username
    pub username: String,
    /// Admin password
    pub password: String,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .finish()
    }
}

impl AdminConfig {
    /// Login settings for the admin service.
    #[must_use]
    pub fn settings(&self) -> AdminSettings {
        AdminSettings {
            username: self.username.clone(),
            password: self.password.clone(),
            session_ttl: chrono::Duration::hours(self.session_ttl_hours),
        }
    }

    /// Whether the built-in password is still in use.
    #[must_use]
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

/// Payment configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Secret shared with the payment terminal; empty disables verification
    pub shared_secret: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("shared_secret", &if self.shared_secret.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

/// Seed configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Load a demo catalog into an empty store at startup
    pub demo_catalog: bool,
}

/// Password used when `ADMIN_PASSWORD` is unset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "change-me";

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed(&lookup, "PORT", "port number", 8080)?,
                log_level: lookup("RUST_LOG").unwrap_or_else(|| "info,kiosk=debug,sqlx=warn".to_string()),
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
                max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", "connection count", 10)?,
                min_connections: parsed(&lookup, "DATABASE_MIN_CONNECTIONS", "connection count", 1)?,
                connect_timeout: parsed(&lookup, "DATABASE_CONNECT_TIMEOUT", "number of seconds", 30)?,
            },
            admin: AdminConfig {
                username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".to_string()),
                password: lookup("ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
                session_ttl_hours: parsed(&lookup, "ADMIN_SESSION_TTL_HOURS", "number of hours", 24)?,
            },
            payment: PaymentConfig {
                shared_secret: lookup("PAYMENT_SHARED_SECRET").unwrap_or_default(),
            },
            seed: SeedConfig {
                demo_catalog: parsed(&lookup, "SEED_DEMO_CATALOG", "boolean", false)?,
            },
        })
    }

    /// Address the server listens on.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value, expected }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.database.url.is_none());
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.admin.password, DEFAULT_ADMIN_PASSWORD);
        assert_eq!(config.admin.session_ttl_hours, 24);
        assert!(!config.seed.demo_catalog);
        assert!(config.payment.shared_secret.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://kiosk@db/kiosk"),
            ("ADMIN_SESSION_TTL_HOURS", "2"),
            ("SEED_DEMO_CATALOG", "true"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url.as_deref(), Some("postgres://kiosk@db/kiosk"));
        assert_eq!(config.admin.session_ttl_hours, 2);
        assert!(config.seed.demo_catalog);
    }

    #[test]
    fn test_invalid_value() {
        let err = load(&[("PORT", "eighty")]).err();
        assert_eq!(
            err,
            Some(ConfigError::Invalid { key: "PORT", value: "eighty".to_string(), expected: "port number" })
        );
    }

    #[test]
    fn test_password_redacted() {
        let config = load(&[("ADMIN_PASSWORD", "hunter2"), ("PAYMENT_SHARED_SECRET", "terminal-key")]).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("terminal-key"));
    }
}
