//! # awx-client
//!
//! Asynchronous transport client for the AWX REST API.
//!
//! [`AwxClient`] turns `(method, endpoint, body)` into an authenticated HTTP
//! request against the configured AWX host and decodes the response into a
//! generic JSON object. It knows nothing about individual object types.
//!
//! ```no_run
//! use awx_client::AwxClient;
//!
//! # async fn example() -> awx_client::Result<()> {
//! let client = AwxClient::builder("https://awx.example.com")
//!     .with_token("my-token")
//!     .build()?;
//! let me = client.current_user().await?;
//! println!("authenticated as {}", me.username);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod auth;
pub mod client;
pub mod models;

pub use client::{AwxClient, AwxClientBuilder};
pub use models::{AssociateRequest, ObjectRole, User};
pub use reqwest::Method;

/// Convenient result alias that reuses the shared AWX error type.
pub type Result<T> = awx_core::Result<T>;
