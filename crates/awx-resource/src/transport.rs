//! The seam between the engine and HTTP.

use async_trait::async_trait;
use awx_client::{AwxClient, Method};
use awx_core::{ApiObject, ApiValue, Result};

/// Sends one request and returns the decoded JSON object.
///
/// [`AwxClient`] is the production implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `method` to `endpoint` with an optional JSON body.
    async fn request(&self, method: Method, endpoint: &str, body: Option<ApiValue>) -> Result<ApiObject>;
}

#[async_trait]
impl Transport for AwxClient {
    async fn request(&self, method: Method, endpoint: &str, body: Option<ApiValue>) -> Result<ApiObject> {
        AwxClient::request(self, method, endpoint, body.as_ref()).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn request(&self, method: Method, endpoint: &str, body: Option<ApiValue>) -> Result<ApiObject> {
        (**self).request(method, endpoint, body).await
    }
}
