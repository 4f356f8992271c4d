//! Provider configuration.
//!
//! Connection settings for an AWX instance: host, credentials, TLS
//! verification and request timeout. Values may be supplied explicitly or
//! picked up from the `TOWER_*`/`AWX_*` environment variables; explicit
//! values always win.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::debug;
use url::Url;
use validator::Validate;

/// Environment variables consulted for the host, in priority order.
pub const HOST_ENV_VARS: [&str; 2] = ["TOWER_HOST", "AWX_HOST"];
/// Environment variables consulted for the username, in priority order.
pub const USERNAME_ENV_VARS: [&str; 2] = ["TOWER_USERNAME", "AWX_USERNAME"];
/// Environment variables consulted for the password, in priority order.
pub const PASSWORD_ENV_VARS: [&str; 2] = ["TOWER_PASSWORD", "AWX_PASSWORD"];
/// Environment variables consulted for the auth token, in priority order.
pub const TOKEN_ENV_VARS: [&str; 2] = ["TOWER_AUTH_TOKEN", "AWX_AUTH_TOKEN"];
/// Environment variables consulted for TLS verification, in priority order.
pub const VERIFY_SSL_ENV_VARS: [&str; 2] = ["TOWER_VERIFY_SSL", "AWX_VERIFY_SSL"];

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credentials used to authenticate against AWX.
///
/// Secrets are redacted from `Debug` output.
#[derive(Debug)]
pub enum Credentials {
    /// HTTP basic authentication
    Basic {
        /// Login name
        username: String,
        /// Password
        password: SecretString,
    },
    /// OAuth2 personal access token, sent as a bearer token
    Token(SecretString),
}

impl Credentials {
    /// Basic credentials.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Token credentials.
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(SecretString::from(token.into()))
    }

    /// Short label for logging.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Token(_) => "token",
        }
    }

    fn check(&self) -> Result<()> {
        match self {
            Self::Basic { username, password } => {
                if username.is_empty() {
                    return Err(Error::Config("username must not be empty".to_string()));
                }
                if password.expose_secret().is_empty() {
                    return Err(Error::Config("password must not be empty".to_string()));
                }
            }
            Self::Token(token) => {
                if token.expose_secret().is_empty() {
                    return Err(Error::Config("token must not be empty".to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Connection settings for an AWX instance.
#[derive(Debug, Validate)]
pub struct ProviderConfig {
    /// AWX base URL, e.g. `https://awx.example.com`
    #[validate(url)]
    pub hostname: String,

    /// Authentication credentials
    pub credentials: Option<Credentials>,

    /// Whether to verify TLS certificates
    pub verify_ssl: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Create a configuration for the given host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid URL.
    pub fn new(hostname: impl Into<String>) -> Result<Self> {
        let config = Self {
            hostname: hostname.into(),
            credentials: None,
            verify_ssl: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        config.validate()?;

        Ok(config)
    }

    /// Build a configuration entirely from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no host is set, the host is invalid, or the
    /// credentials are missing or conflicting.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ProviderConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hostname = first_set_var(&lookup, &HOST_ENV_VARS).ok_or_else(|| {
            Error::Config(
                "unknown AWX host, set it explicitly or via TOWER_HOST or AWX_HOST".to_string(),
            )
        })?;

        let mut config = Self::new(hostname)?.merge_lookup(&lookup);
        if config.credentials.is_none() {
            config.credentials = credentials_from_lookup(&lookup)?;
        }
        config.check()?;

        Ok(config)
    }

    /// Fill the settings that may still be taken from the environment.
    ///
    /// Only the TLS flag can be overridden here; credentials already set on
    /// the configuration are kept.
    #[must_use]
    pub fn merge_env(self) -> Self {
        self.merge_lookup(&|name: &str| std::env::var(name).ok())
    }

    fn merge_lookup<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = first_set_var(lookup, &VERIFY_SSL_ENV_VARS) {
            self.verify_ssl = str_to_bool(&value);
            debug!(verify_ssl = self.verify_ssl, "TLS verification taken from the environment");
        }
        self
    }

    /// Set basic credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::basic(username, password));
        self
    }

    /// Set token credentials.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::token(token));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the host into a URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be parsed.
    pub fn parse_hostname(&self) -> Result<Url> {
        Url::parse(&self.hostname)
            .map_err(|e| Error::Config(format!("Invalid AWX host `{}`: {e}", self.hostname)))
    }

    /// Validate field values and require exactly one credential scheme.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        match &self.credentials {
            Some(credentials) => credentials.check(),
            None => Err(Error::Config(
                "must provide one of [\"username\", \"password\"] or \"token\"".to_string(),
            )),
        }
    }
}

fn credentials_from_lookup<F>(lookup: &F) -> Result<Option<Credentials>>
where
    F: Fn(&str) -> Option<String>,
{
    let username = first_set_var(lookup, &USERNAME_ENV_VARS);
    let password = first_set_var(lookup, &PASSWORD_ENV_VARS);
    let token = first_set_var(lookup, &TOKEN_ENV_VARS);

    match (username, password, token) {
        (None, None, None) => Ok(None),
        (None, None, Some(token)) => Ok(Some(Credentials::token(token))),
        (Some(username), Some(password), None) => Ok(Some(Credentials::basic(username, password))),
        (Some(_), None, None) => Err(Error::Config(
            "username is set but no password, set TOWER_PASSWORD or AWX_PASSWORD".to_string(),
        )),
        (None, Some(_), None) => Err(Error::Config(
            "password is set but no username, set TOWER_USERNAME or AWX_USERNAME".to_string(),
        )),
        _ => Err(Error::Config(
            "must provide one of [\"username\", \"password\"] or \"token\", not both".to_string(),
        )),
    }
}

/// Return the value of the first variable that is set and non-empty.
#[must_use]
pub fn first_set_env_var(names: &[&str]) -> Option<String> {
    first_set_var(&|name: &str| std::env::var(name).ok(), names)
}

fn first_set_var<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
}

/// Lenient boolean parsing for environment flags.
///
/// Accepts `1`, `t` and `true` in any case as true; everything else,
/// including unparseable text, is false.
#[must_use]
pub fn str_to_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "t" | "true")
}
