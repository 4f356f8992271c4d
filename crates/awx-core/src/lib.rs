//! # awx-core
//!
//! Core types and utilities shared by the AWX resource-access layer.
//!
//! This crate provides the typed attribute model, diagnostics aggregation,
//! search-envelope handling, error taxonomy and configuration used by the
//! transport client and the generic resource engine.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and conversions from external error types
//! - [`value`] - Typed attribute values and attribute sets
//! - [`diagnostics`] - Fail-soft diagnostics aggregation
//! - [`envelope`] - Search-envelope unwrapping
//! - [`config`] - Provider configuration and environment loading
//! - [`client`] - HTTP client settings and defaults
//! - [`query`] - Query-string builder for lookup endpoints

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod error;
pub mod query;
pub mod value;

// Re-export commonly used types
pub use client::ClientConfig;
pub use config::{Credentials, ProviderConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, Result};
pub use query::QueryParams;
pub use value::{ApiObject, ApiValue, AttrValue, AttributeSet, TypedAttribute};
