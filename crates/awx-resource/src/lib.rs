//! # awx-resource
//!
//! Schema-driven access to AWX objects.
//!
//! Object types are declared as data ([`ResourceSchema`]) and driven by one
//! generic [`ResourceEngine`]: the engine resolves lookups, encodes write
//! payloads, unwraps search envelopes, decodes responses into typed
//! attributes and runs post-decode hooks.
//!
//! ```no_run
//! use awx_client::AwxClient;
//! use awx_core::{AttrValue, AttributeSet};
//! use awx_resource::{catalog, CallContext, Callee, ResourceEngine, Source};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AwxClient::builder("https://awx.example.com")
//!     .with_token("my-token")
//!     .build()?;
//! let engine = ResourceEngine::new(client, catalog::team());
//!
//! let ctx = CallContext::new("24.6.1", Source::DataSource, Callee::Read);
//! let config = AttributeSet::new().with("name", AttrValue::string("ops"));
//! let outcome = engine.read_data_source(&ctx, &config).await?;
//! for diagnostic in &outcome.diagnostics {
//!     eprintln!("{diagnostic}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Object type declarations and validation
//! - [`marshal`] - Wire to typed attribute conversion
//! - [`resolve`] - Lookup group resolution
//! - [`hooks`] - Call context and post-decode hooks
//! - [`engine`] - Lifecycle operations
//! - [`association`] - Parent/child sub-collections
//! - [`roles`] - Object role listings
//! - [`catalog`] - Built-in object tables

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod association;
pub mod catalog;
pub mod engine;
pub mod hooks;
pub mod marshal;
pub mod resolve;
pub mod roles;
pub mod schema;
pub mod transport;

pub use association::{parse_import_id, Association};
pub use engine::{OperationError, OperationResult, Outcome, ResourceEngine};
pub use hooks::{CallContext, Callee, Hook, Source};
pub use resolve::{resolve, LookupGroup, LookupStyle, ResolvedEndpoint};
pub use roles::object_roles;
pub use schema::{Access, AttributeKind, AttributeSpec, ResourceSchema, UpdateMethod};
pub use transport::Transport;

/// Convenient result alias that reuses the shared AWX error type.
pub type Result<T> = awx_core::Result<T>;
