//! HTTP client settings.
//!
//! Timeouts and TLS settings for the AWX transport client.
//! The transport never retries; callers that want retries wrap the request
//! themselves and consult [`Error::is_transient`](crate::Error::is_transient).

use std::time::Duration;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connect timeout
    pub connect_timeout: Duration,

    /// Accept invalid TLS certificates (self-signed AWX installs)
    pub accept_invalid_certs: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            accept_invalid_certs: false,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Accept invalid TLS certificates.
    #[must_use]
    pub const fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.accept_invalid_certs = insecure;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&crate::config::ProviderConfig> for ClientConfig {
    fn from(config: &crate::config::ProviderConfig) -> Self {
        Self::new()
            .with_timeout(config.timeout())
            .with_insecure_tls(!config.verify_ssl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn test_client_config_new() {
        let config = ClientConfig::new();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT));
        assert_eq!(config.connect_timeout, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT));
        assert!(!config.accept_invalid_certs);
        assert_eq!(ClientConfig::default(), config);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(5))
            .with_insecure_tls(true);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn test_from_provider_config() {
        let provider = ProviderConfig::new("https://awx.example.com")
            .unwrap()
            .with_timeout(45)
            .with_verify_ssl(false);
        let config = ClientConfig::from(&provider);
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert!(config.accept_invalid_certs);
    }
}
