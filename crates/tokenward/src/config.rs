//! Token service configuration.
//!
//! Configuration is read from an optional TOML file and then overridden by
//! environment variables prefixed with `TOKENWARD`, using `__` as the section
//! separator (e.g. `TOKENWARD__SIGNING__PRIVATE_KEY`).
//!
//! # Example (TOML)
//!
//! ```toml
//! [signing]
//! private_key = "change-me"
//!
//! [lifetimes]
//! access_token = "15m"
//! verify_email = "24h"
//!
//! [store]
//! backend = "redis"
//! url = "redis://127.0.0.1:6379"
//! operation_timeout = "2s"
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::claims::TokenType;
use crate::signer::SigningKey;

/// Default configuration file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "tokenward.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "TOKENWARD";

/// Root token service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Signing secret.
    pub signing: SigningConfig,

    /// Default lifetime per token type.
    pub lifetimes: LifetimeConfig,

    /// Backing store for stateful tokens.
    pub store: StoreConfig,
}

/// Signing configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// The single pre-shared HS512 secret. Required.
    pub private_key: String,
}

impl SigningConfig {
    /// Returns the secret as a [`SigningKey`].
    #[must_use]
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::new(self.private_key.clone())
    }
}

impl fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningConfig")
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Default lifetimes used when callers do not pick one.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifetimeConfig {
    /// Stateless access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token: Duration,

    /// Password reset link lifetime.
    #[serde(with = "humantime_serde")]
    pub reset_password: Duration,

    /// Email verification link lifetime.
    #[serde(with = "humantime_serde")]
    pub verify_email: Duration,
}

impl Default for LifetimeConfig {
    fn default() -> Self {
        Self {
            access_token: Duration::from_secs(15 * 60),         // 15 minutes
            refresh_token: Duration::from_secs(30 * 24 * 3600), // 30 days
            reset_password: Duration::from_secs(3600),          // 1 hour
            verify_email: Duration::from_secs(24 * 3600),       // 24 hours
        }
    }
}

impl LifetimeConfig {
    /// Returns the configured lifetime for `token_type`.
    #[must_use]
    pub fn for_type(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::AccessToken => self.access_token,
            TokenType::RefreshToken => self.refresh_token,
            TokenType::ResetPassword => self.reset_password,
            TokenType::VerifyEmail => self.verify_email,
        }
    }
}

/// Which key-value store backs stateful tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map. Tokens do not survive restarts.
    #[default]
    Memory,
    /// Redis server.
    Redis,
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend.
    pub backend: StoreBackend,

    /// Redis connection URL. Required for the redis backend.
    pub url: Option<String>,

    /// Maximum pooled connections.
    pub pool_size: usize,

    /// Prefix for every key written to the store.
    pub key_prefix: String,

    /// Deadline for a single store call when the caller sets none.
    #[serde(with = "humantime_serde")]
    pub operation_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            url: None,
            pool_size: 16,
            key_prefix: "tokenward:".to_string(),
            operation_timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration sources could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl TokenConfig {
    /// Creates a configuration with defaults and the given signing secret.
    #[must_use]
    pub fn with_private_key(private_key: impl Into<String>) -> Self {
        Self {
            signing: SigningConfig {
                private_key: private_key.into(),
            },
            ..Self::default()
        }
    }

    /// Loads configuration from `path` (or [`DEFAULT_CONFIG_FILE`] if present)
    /// and `TOKENWARD__*` environment variables, then validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if an explicit `path` does not exist or a
    /// source cannot be parsed, and the validation errors of
    /// [`TokenConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::Load(format!(
                        "config file not found: {}",
                        p.display()
                    )));
                }
                builder = builder.add_source(File::from(p));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );

        let config: TokenConfig = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if:
    /// - The signing private key is empty
    /// - The redis backend is selected without a URL
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - Any token lifetime is zero
    /// - The pool size or operation timeout is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing.private_key.is_empty() {
            return Err(ConfigError::Missing("signing.private_key".to_string()));
        }
        if self.signing.private_key.len() < 32 {
            tracing::warn!(
                length = self.signing.private_key.len(),
                "signing.private_key is shorter than 32 bytes"
            );
        }

        for token_type in TokenType::ALL {
            if self.lifetimes.for_type(token_type).is_zero() {
                return Err(ConfigError::InvalidValue(format!(
                    "lifetimes.{} must be > 0",
                    token_type
                )));
            }
        }

        if self.store.backend == StoreBackend::Redis
            && self.store.url.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Missing(
                "store.url is required for the redis backend".to_string(),
            ));
        }

        if self.store.pool_size == 0 {
            return Err(ConfigError::InvalidValue(
                "store.pool_size must be > 0".to_string(),
            ));
        }

        if self.store.operation_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "store.operation_timeout must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TokenConfig::default();
        assert!(config.signing.private_key.is_empty());
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.key_prefix, "tokenward:");
        assert_eq!(config.store.operation_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_default_config_requires_private_key() {
        let err = TokenConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(err.to_string().contains("private_key"));

        assert!(TokenConfig::with_private_key("k".repeat(64)).validate().is_ok());
    }

    #[test]
    fn test_default_lifetimes() {
        let lifetimes = LifetimeConfig::default();
        assert_eq!(
            lifetimes.for_type(TokenType::AccessToken),
            Duration::from_secs(900)
        );
        assert_eq!(
            lifetimes.for_type(TokenType::ResetPassword),
            Duration::from_secs(3600)
        );
        assert_eq!(
            lifetimes.for_type(TokenType::VerifyEmail),
            Duration::from_secs(86400)
        );
        assert_eq!(
            lifetimes.for_type(TokenType::RefreshToken),
            Duration::from_secs(30 * 86400)
        );
    }

    #[test]
    fn test_zero_lifetime_fails_validation() {
        let mut config = TokenConfig::with_private_key("secret");
        config.lifetimes.verify_email = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
        assert!(err.to_string().contains("verify_email"));
    }

    #[test]
    fn test_redis_backend_requires_url() {
        let mut config = TokenConfig::with_private_key("secret");
        config.store.backend = StoreBackend::Redis;
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.store.url = Some(String::new());
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.store.url = Some("redis://127.0.0.1:6379".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_fails_validation() {
        let mut config = TokenConfig::with_private_key("secret");
        config.store.pool_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn test_zero_operation_timeout_fails_validation() {
        let mut config = TokenConfig::with_private_key("secret");
        config.store.operation_timeout = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("operation_timeout"));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let config = TokenConfig::with_private_key("super-secret-value");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[signing]
private_key = "file-secret"

[lifetimes]
access_token = "5m"

[store]
backend = "redis"
url = "redis://cache:6379"
operation_timeout = "250ms"
"#
        )
        .unwrap();

        let config = TokenConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.signing.private_key, "file-secret");
        assert_eq!(config.lifetimes.access_token, Duration::from_secs(300));
        // Unset fields keep their defaults
        assert_eq!(config.lifetimes.verify_email, Duration::from_secs(86400));
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert_eq!(config.store.url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.store.operation_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = TokenConfig::load(Some(Path::new("/nonexistent/tokenward.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue("test error".to_string());
        assert_eq!(err.to_string(), "Invalid configuration value: test error");

        let err = ConfigError::Missing("required_field".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: required_field"
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = TokenConfig::with_private_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TokenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.signing.private_key, "secret");
        assert_eq!(parsed.lifetimes.access_token, config.lifetimes.access_token);
        assert_eq!(parsed.store.backend, config.store.backend);
    }
}
