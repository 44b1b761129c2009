//! Scrapoxy client configuration.

use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the commander API URL.
pub const ENV_API_URL: &str = "SCRAPOXY_API_URL";
/// Environment variable holding the commander password.
pub const ENV_PASSWORD: &str = "SCRAPOXY_PASSWORD";
/// Environment variable overriding the request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SCRAPOXY_TIMEOUT_SECS";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },

    /// The HTTP transport could not be built from this configuration.
    #[error("Failed to build transport: {0}")]
    Transport(String),

    /// The client-owned execution engine could not be started.
    #[error("Failed to start execution engine: {0}")]
    Engine(#[from] std::io::Error),
}

/// Scrapoxy client configuration.
///
/// Immutable once handed to a client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Commander API URL. Endpoints are appended verbatim.
    pub base_url: String,
    /// Pre-shared commander password.
    pub credential: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with default transport settings.
    pub fn new(base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credential: credential.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("scrapoxy-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Create a new configuration builder.
    pub fn builder(
        base_url: impl Into<String>,
        credential: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::new(base_url, credential),
        }
    }

    /// Load configuration from `SCRAPOXY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = env::var(ENV_API_URL).map_err(|_| ConfigError::MissingEnv(ENV_API_URL))?;
        let credential =
            env::var(ENV_PASSWORD).map_err(|_| ConfigError::MissingEnv(ENV_PASSWORD))?;

        let mut config = Self::new(base_url, credential);
        if let Ok(value) = env::var(ENV_TIMEOUT_SECS) {
            let secs = value.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_TIMEOUT_SECS,
                value: value.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("credential", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Builder for Scrapoxy client configuration.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://localhost:8889/api/", "secret");
        assert_eq!(config.base_url, "http://localhost:8889/api/");
        assert_eq!(config.credential, "secret");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("scrapoxy-client/"));
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::builder("http://commander/api/", "pw")
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .user_agent("ops-tool")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "ops-tool");
    }

    #[test]
    fn test_debug_redacts_credential() {
        let config = ClientConfig::new("http://commander/api/", "hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    // Single test so the environment is not mutated concurrently.
    #[test]
    fn test_from_env() {
        unsafe {
            env::remove_var(ENV_API_URL);
            env::remove_var(ENV_PASSWORD);
            env::remove_var(ENV_TIMEOUT_SECS);
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::MissingEnv(ENV_API_URL))
        ));

        unsafe {
            env::set_var(ENV_API_URL, "http://commander/api/");
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::MissingEnv(ENV_PASSWORD))
        ));

        unsafe {
            env::set_var(ENV_PASSWORD, "pw");
            env::set_var(ENV_TIMEOUT_SECS, "abc");
        }
        assert!(matches!(
            ClientConfig::from_env(),
            Err(ConfigError::InvalidEnv { name: ENV_TIMEOUT_SECS, .. })
        ));

        unsafe {
            env::set_var(ENV_TIMEOUT_SECS, "7");
        }
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.base_url, "http://commander/api/");
        assert_eq!(config.credential, "pw");
        assert_eq!(config.timeout, Duration::from_secs(7));

        unsafe {
            env::remove_var(ENV_API_URL);
            env::remove_var(ENV_PASSWORD);
            env::remove_var(ENV_TIMEOUT_SECS);
        }
    }
}
