//! Request authentication.

use awx_core::config::Credentials;
use reqwest::RequestBuilder;
use secrecy::ExposeSecret;

/// Attach credentials to an outgoing request.
pub(crate) fn authorize(request: RequestBuilder, credentials: &Credentials) -> RequestBuilder {
    match credentials {
        Credentials::Basic { username, password } => {
            request.basic_auth(username, Some(password.expose_secret()))
        }
        Credentials::Token(token) => request.bearer_auth(token.expose_secret()),
    }
}
