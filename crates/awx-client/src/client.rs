//! Asynchronous AWX transport client.

use crate::auth::authorize;
use crate::models::User;
use crate::Result;
use awx_core::client::ClientConfig;
use awx_core::config::{Credentials, ProviderConfig};
use awx_core::envelope;
use awx_core::value::{shape_of, ApiObject, ApiValue};
use awx_core::Error;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method, Request, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("awx-client/", env!("CARGO_PKG_VERSION"));
const JSON: &str = "application/json";

/// Endpoint returning the authenticated user.
pub const ME_ENDPOINT: &str = "/api/v2/me/";

/// Builder for [`AwxClient`].
#[derive(Debug)]
pub struct AwxClientBuilder {
    base_url: String,
    credentials: Option<Credentials>,
    http_config: ClientConfig,
}

impl AwxClientBuilder {
    /// Create a builder for the given AWX base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            http_config: ClientConfig::new(),
        }
    }

    /// Create a builder from provider settings, taking over its credentials.
    #[must_use]
    pub fn from_config(config: ProviderConfig) -> Self {
        let http_config = ClientConfig::from(&config);
        Self {
            base_url: config.hostname,
            credentials: config.credentials,
            http_config,
        }
    }

    /// Use the given credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Use HTTP basic authentication.
    #[must_use]
    pub fn with_basic_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with_credentials(Credentials::basic(username, password))
    }

    /// Use bearer token authentication.
    #[must_use]
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.with_credentials(Credentials::token(token))
    }

    /// Override the HTTP client configuration used when building the client.
    #[must_use]
    pub fn with_http_config(mut self, http_config: ClientConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Finalise the builder and create the [`AwxClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn build(self) -> Result<AwxClient> {
        let mut base_url = Url::parse(&self.base_url)
            .map_err(|err| Error::Config(format!("Invalid AWX host `{}`: {err}", self.base_url)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_config = self.http_config;
        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(http_config.timeout)
            .connect_timeout(http_config.connect_timeout);

        if http_config.accept_invalid_certs {
            warn!(host = %base_url, "TLS verification disabled for AWX client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|err| Error::Config(format!("Failed to build AWX HTTP client: {err}")))?;

        Ok(AwxClient {
            http,
            base_url,
            credentials: self.credentials.map(Arc::new),
        })
    }
}

/// Asynchronous client for the AWX REST API.
///
/// Cloning is cheap; clones share the connection pool and credentials.
#[derive(Clone)]
pub struct AwxClient {
    http: Client,
    base_url: Url,
    credentials: Option<Arc<Credentials>>,
}

impl fmt::Debug for AwxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwxClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.credentials.as_deref().map(Credentials::scheme))
            .finish_non_exhaustive()
    }
}

impl AwxClient {
    /// Create a client with default HTTP settings and no credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        AwxClientBuilder::new(base_url).build()
    }

    /// Construct a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation or the client cannot
    /// be built.
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        config.check()?;
        AwxClientBuilder::from_config(config).build()
    }

    /// Start a builder for the given base URL.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> AwxClientBuilder {
        AwxClientBuilder::new(base_url)
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_url(&self, endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.trim_start_matches('/');
        self.base_url
            .join(endpoint)
            .map_err(|err| Error::InvalidEndpoint(format!("Invalid AWX endpoint `{endpoint}`: {err}")))
    }

    /// Build an authenticated request without sending it.
    ///
    /// The leading `/` of the endpoint is ignored, so `/api/v2/hosts/` and
    /// `api/v2/hosts/` are equivalent.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint does not form a valid URL.
    pub fn new_request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&ApiValue>,
    ) -> Result<Request> {
        let url = self.build_url(endpoint)?;
        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON);

        if let Some(credentials) = &self.credentials {
            request = authorize(request, credentials);
        }
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        Ok(request.build()?)
    }

    /// Send a prepared request and decode the response body.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] or [`Error::Timeout`] for network failures
    /// - [`Error::HttpStatus`] for any non-2xx status
    /// - [`Error::Decode`] if the body is not a JSON object
    pub async fn execute(&self, request: Request) -> Result<ApiObject> {
        let method = request.method().clone();
        let endpoint = endpoint_of(request.url());

        debug!(method = %method, endpoint = %endpoint, "Sending AWX request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        let payload = response.text().await?;

        debug!(method = %method, endpoint = %endpoint, status = status.as_u16(), "AWX response received");

        if !status.is_success() {
            return Err(map_status_to_error(status, &method, &endpoint, payload));
        }

        decode_body(&payload).map_err(|err| match err {
            Error::Decode(message) => {
                Error::Decode(format!("{method} {endpoint}: {message}"))
            }
            other => other,
        })
    }

    /// Build, send and decode a request.
    ///
    /// # Errors
    ///
    /// See [`AwxClient::new_request`] and [`AwxClient::execute`].
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&ApiValue>,
    ) -> Result<ApiObject> {
        let request = self.new_request(method, endpoint, body)?;
        self.execute(request).await
    }

    /// Like [`AwxClient::request`], bounded by a caller-supplied deadline.
    ///
    /// The in-flight request is dropped when the deadline passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] when the deadline passes, otherwise the
    /// errors of [`AwxClient::request`].
    pub async fn request_with_timeout(
        &self,
        timeout: Duration,
        method: Method,
        endpoint: &str,
        body: Option<&ApiValue>,
    ) -> Result<ApiObject> {
        let label = format!("{method} {endpoint}");
        tokio::time::timeout(timeout, self.request(method, endpoint, body))
            .await
            .map_err(|_| Error::Timeout(format!("{label} did not complete within {timeout:?}")))?
    }

    /// `GET` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`AwxClient::request`].
    pub async fn get(&self, endpoint: &str) -> Result<ApiObject> {
        self.request(Method::GET, endpoint, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AwxClient::request`].
    pub async fn post(&self, endpoint: &str, body: &ApiValue) -> Result<ApiObject> {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`AwxClient::request`].
    pub async fn patch(&self, endpoint: &str, body: &ApiValue) -> Result<ApiObject> {
        self.request(Method::PATCH, endpoint, Some(body)).await
    }

    /// `DELETE` an endpoint.
    ///
    /// # Errors
    ///
    /// See [`AwxClient::request`].
    pub async fn delete(&self, endpoint: &str) -> Result<ApiObject> {
        self.request(Method::DELETE, endpoint, None).await
    }

    /// Fetch the user the client is authenticated as.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not
    /// describe exactly one user.
    pub async fn current_user(&self) -> Result<User> {
        let data = envelope::unwrap(self.get(ME_ENDPOINT).await?)?;
        let user = serde_json::from_value(ApiValue::Object(data))?;
        Ok(user)
    }
}

fn endpoint_of(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn decode_body(payload: &str) -> Result<ApiObject> {
    if payload.trim().is_empty() {
        return Ok(ApiObject::new());
    }
    match serde_json::from_str::<ApiValue>(payload)? {
        ApiValue::Object(object) => Ok(object),
        other => Err(Error::Decode(format!(
            "expected a JSON object, found {}",
            shape_of(&other)
        ))),
    }
}

fn map_status_to_error(status: StatusCode, method: &Method, endpoint: &str, body: String) -> Error {
    Error::HttpStatus {
        status: status.as_u16(),
        method: method.to_string(),
        endpoint: endpoint.to_string(),
        body,
    }
}
