//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use arena::{WinnerValidation, db::DatabaseConfig};
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Keep events and wallets in memory instead of PostgreSQL
    pub in_memory: bool,
    /// Security configuration
    pub security: SecurityConfig,
    /// Event engine settings
    pub events: EventSettings,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Bearer token required on admin routes (required)
    pub admin_token: String,
}

/// Event engine settings
#[derive(Debug, Clone, Default)]
pub struct EventSettings {
    /// Reject match results naming neither participant
    pub strict_winner_validation: bool,
}

impl EventSettings {
    pub fn winner_validation(&self) -> WinnerValidation {
        if self.strict_winner_validation {
            WinnerValidation::Strict
        } else {
            WinnerValidation::Lenient
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `in_memory` - Use in-memory storage (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
        in_memory: bool,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr_var("SERVER_BIND")?.unwrap_or(default_bind()),
        };

        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database.database_url = url;
        }

        // Security configuration (REQUIRED)
        let admin_token =
            std::env::var("ADMIN_TOKEN").map_err(|_| ConfigError::MissingRequired {
                var: "ADMIN_TOKEN".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let config = ServerConfig {
            bind,
            database,
            in_memory: in_memory || parse_env_or("ARENA_IN_MEMORY", false),
            security: SecurityConfig { admin_token },
            events: EventSettings {
                strict_winner_validation: parse_env_or("STRICT_WINNER_VALIDATION", false),
            },
            metrics_bind: parse_addr_var("METRICS_BIND")?,
        };

        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.admin_token.trim().len() < 16 {
            return Err(ConfigError::Invalid {
                var: "ADMIN_TOKEN".to_string(),
                reason: "Must be at least 16 characters".to_string(),
            });
        }

        if !self.in_memory && self.database.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must not be empty unless --in-memory is set".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if let Some(metrics_bind) = self.metrics_bind
            && metrics_bind == self.bind
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Used when neither `--bind` nor `SERVER_BIND` is given
fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

/// Parse an optional socket address variable; a set but malformed value is an error
fn parse_addr_var(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::Invalid {
                    var: key.to_string(),
                    reason: format!("'{}' is not a socket address", value),
                })
        }
        _ => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig::development(),
            in_memory: false,
            security: SecurityConfig {
                admin_token: "a".repeat(16),
            },
            events: EventSettings::default(),
            metrics_bind: None,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "ADMIN_TOKEN".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ADMIN_TOKEN"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_short_admin_token_rejected() {
        let mut config = config();
        config.security.admin_token = "short".to_string();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "ADMIN_TOKEN"));
    }

    #[test]
    fn test_empty_database_url_allowed_in_memory() {
        let mut config = config();
        config.database.database_url = String::new();
        assert!(config.validate().is_err());

        config.in_memory = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_bounds_checked() {
        let mut config = config();
        config.database.min_connections = 50;
        config.database.max_connections = 10;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_metrics_bind_must_differ() {
        let mut config = config();
        config.metrics_bind = Some(config.bind);
        assert!(config.validate().is_err());

        config.metrics_bind = Some("127.0.0.1:9000".parse().unwrap());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_winner_validation_mode() {
        let mut settings = EventSettings::default();
        assert_eq!(settings.winner_validation(), WinnerValidation::Lenient);

        settings.strict_winner_validation = true;
        assert_eq!(settings.winner_validation(), WinnerValidation::Strict);
    }

    #[test]
    fn test_parse_env_or_default() {
        let value: u32 = parse_env_or("ARENA_TEST_UNSET_VARIABLE", 42);
        assert_eq!(value, 42);
    }
}
