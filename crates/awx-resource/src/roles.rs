//! Object role listings.

use crate::transport::Transport;
use awx_client::{Method, ObjectRole};
use awx_core::{ApiValue, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RoleListing {
    #[serde(default)]
    results: Vec<ObjectRole>,
}

/// Endpoint listing the roles of one object.
#[must_use]
pub fn object_roles_endpoint(base: &str, id: i64) -> String {
    format!("{}/{id}/object_roles/", base.trim_end_matches('/'))
}

/// Role name to role id for the object `id` under `base`.
///
/// # Errors
///
/// Returns the transport error, or [`awx_core::Error::Decode`] if the
/// listing does not hold role objects.
pub async fn object_roles<T: Transport + ?Sized>(
    transport: &T,
    base: &str,
    id: i64,
) -> Result<BTreeMap<String, i64>> {
    let endpoint = object_roles_endpoint(base, id);
    let listing = transport.request(Method::GET, &endpoint, None).await?;
    let listing: RoleListing = serde_json::from_value(ApiValue::Object(listing))?;

    debug!(endpoint = %endpoint, roles = listing.results.len(), "listed object roles");
    Ok(listing
        .results
        .into_iter()
        .map(|role| (role.name, role.id))
        .collect())
}
