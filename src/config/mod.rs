//! Configuration module for Kitsune Authr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and startup validation. All values are
//! immutable for the life of the process once loaded.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub token: TokenConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub users: Vec<UserEntry>,
}

impl Config {
    /// Load configuration from a file
    ///
    /// Environment variables are expanded over the whole file content
    /// before parsing.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Server address cannot be empty".into(),
            ));
        }

        if self.token.secret.len() < 16 {
            return Err(ConfigError::ValidationError(
                "Signing secret must be at least 16 characters".into(),
            ));
        }

        if self.token.expiration_secs <= 0 {
            return Err(ConfigError::ValidationError(
                "Token expiration must be positive".into(),
            ));
        }

        if self.token.header_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Token header name cannot be empty".into(),
            ));
        }

        if self.users.is_empty() {
            return Err(ConfigError::ValidationError(
                "At least one user must be configured".into(),
            ));
        }

        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "User entries must have a username".into(),
                ));
            }
            if user.password.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "User '{}' has an empty password",
                    user.username
                )));
            }
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
}

/// Token issuance and extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// HS256 signing secret, shared by issuance and verification
    pub secret: String,

    /// Token lifetime in seconds. Default: 86400 (24 hours)
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: i64,

    /// Request header carrying the token. Default: "Authorization"
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// Scheme prefix stripped from the header value. Default: "Bearer "
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,
}

fn default_expiration_secs() -> i64 {
    86400 // 24 hours
}

fn default_header_name() -> String {
    "Authorization".to_string()
}

fn default_token_prefix() -> String {
    "Bearer ".to_string()
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}

/// A user entry for the in-memory directory
///
/// The plaintext password is hashed when the directory is built and is not
/// retained afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub real_name: String,
    #[serde(default = "default_home_path")]
    pub home_path: String,
    #[serde(default)]
    pub roles: HashSet<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_home_path() -> String {
    "/".to_string()
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                address: "127.0.0.1:0".into(),
            },
            token: TokenConfig {
                secret: "config-test-signing-secret".into(),
                expiration_secs: default_expiration_secs(),
                header_name: default_header_name(),
                token_prefix: default_token_prefix(),
            },
            metrics: MetricsConfig::default(),
            users: vec![UserEntry {
                username: "admin".into(),
                password: "123456".into(),
                real_name: "Administrator".into(),
                home_path: "/dashboard".into(),
                roles: HashSet::from(["admin".to_string()]),
                enabled: true,
            }],
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = test_config();
        config.token.secret = "short".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_users_rejected() {
        let mut config = test_config();
        config.users.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nonpositive_expiration_rejected() {
        let mut config = test_config();
        config.token.expiration_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("KITSUNE_CONFIG_TEST_VAR", "test_value");
        let expanded = expand_env_vars("key: ${KITSUNE_CONFIG_TEST_VAR}");
        assert_eq!(expanded, "key: test_value");
        std::env::remove_var("KITSUNE_CONFIG_TEST_VAR");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let expanded = expand_env_vars("secret: ${KITSUNE_CONFIG_TEST_MISSING:-fallback}");
        assert_eq!(expanded, "secret: fallback");
    }

    #[test]
    fn test_missing_var_without_default_keeps_placeholder() {
        let expanded = expand_env_vars("secret: ${KITSUNE_CONFIG_TEST_MISSING}");
        assert_eq!(expanded, "secret: ${KITSUNE_CONFIG_TEST_MISSING}");
    }
}
