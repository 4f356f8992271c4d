//! Parent/child associations.
//!
//! AWX links objects through sub-collections such as
//! `/api/v2/hosts/<host>/groups/`. Posting `{"id": <child>}` links the
//! child, adding `"disassociate": true` unlinks it.

use crate::transport::Transport;
use awx_client::{AssociateRequest, Method};
use awx_core::{ApiValue, Error, Result};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// One association sub-collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Association {
    /// Name used in logs and errors, e.g. `host_group`
    pub name: &'static str,
    /// Endpoint with an `{id}` placeholder for the parent id
    pub endpoint_template: &'static str,
}

impl Association {
    /// Declare an association.
    #[must_use]
    pub const fn new(name: &'static str, endpoint_template: &'static str) -> Self {
        Self {
            name,
            endpoint_template,
        }
    }

    /// Sub-collection endpoint for `parent`, always with a trailing slash.
    #[must_use]
    pub fn endpoint(&self, parent: i64) -> String {
        let endpoint = self.endpoint_template.replace("{id}", &parent.to_string());
        format!("{}/", endpoint.trim_end_matches('/'))
    }

    async fn post<T: Transport + ?Sized>(
        &self,
        transport: &T,
        parent: i64,
        request: AssociateRequest,
    ) -> Result<()> {
        let endpoint = self.endpoint(parent);
        debug!(
            association = self.name,
            endpoint = %endpoint,
            child = request.id,
            disassociate = request.disassociate,
            "updating association"
        );
        let body = serde_json::to_value(request)?;
        transport.request(Method::POST, &endpoint, Some(body)).await?;
        Ok(())
    }

    /// Link `child` to `parent`.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    pub async fn associate<T: Transport + ?Sized>(&self, transport: &T, parent: i64, child: i64) -> Result<()> {
        self.post(transport, parent, AssociateRequest::associate(child)).await
    }

    /// Unlink `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Returns the transport error.
    pub async fn disassociate<T: Transport + ?Sized>(&self, transport: &T, parent: i64, child: i64) -> Result<()> {
        self.post(transport, parent, AssociateRequest::disassociate(child)).await
    }

    /// Ids currently linked to `parent`, across every page of the listing.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or [`Error::Decode`] if a page is not a
    /// search envelope of objects with integer ids, or if the ids collected
    /// do not add up to the listing's `count`.
    pub async fn members<T: Transport + ?Sized>(&self, transport: &T, parent: i64) -> Result<BTreeSet<i64>> {
        let mut endpoint = self.endpoint(parent);
        let mut members = BTreeSet::new();
        let mut count = None;

        loop {
            let page = transport.request(Method::GET, &endpoint, None).await?;
            if count.is_none() {
                count = page.get("count").and_then(ApiValue::as_u64);
            }

            let results = page
                .get("results")
                .and_then(ApiValue::as_array)
                .ok_or_else(|| Error::Decode(format!("{endpoint}: listing has no results array")))?;
            for item in results {
                let id = item
                    .get("id")
                    .and_then(ApiValue::as_i64)
                    .ok_or_else(|| Error::Decode(format!("{endpoint}: entry without an integer id")))?;
                members.insert(id);
            }

            let next = match page.get("next").and_then(ApiValue::as_str) {
                Some(next) if !next.is_empty() => next_endpoint(next),
                _ => break,
            };
            if next == endpoint {
                return Err(Error::Decode(format!("{endpoint}: next page points back to itself")));
            }
            debug!(association = self.name, next = %next, "following next page");
            endpoint = next;
        }

        if let Some(count) = count {
            if usize::try_from(count).ok() != Some(members.len()) {
                return Err(Error::Decode(format!(
                    "{}: listing reported {count} entries, collected {}",
                    self.endpoint(parent),
                    members.len()
                )));
            }
        }
        Ok(members)
    }

    /// Bring the linked set in line with `desired`.
    ///
    /// Links missing children first, then unlinks extra ones. Stops at the
    /// first failure.
    ///
    /// # Errors
    ///
    /// Returns the first transport or decode error.
    pub async fn reconcile<T: Transport + ?Sized>(
        &self,
        transport: &T,
        parent: i64,
        desired: &BTreeSet<i64>,
    ) -> Result<()> {
        let current = self.members(transport, parent).await?;

        for child in desired.difference(&current) {
            self.associate(transport, parent, *child).await?;
        }
        for child in current.difference(desired) {
            self.disassociate(transport, parent, *child).await?;
        }
        Ok(())
    }
}

/// Path and query of a `next` link, which AWX may send as an absolute URL.
fn next_endpoint(next: &str) -> String {
    match Url::parse(next) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        },
        Err(_) => next.to_string(),
    }
}

/// Parse an import id of the form `<parent>/<child>`.
///
/// # Errors
///
/// Returns [`Error::Config`] naming the part that is not an integer.
pub fn parse_import_id(id: &str) -> Result<(i64, i64)> {
    let (parent, child) = id
        .split_once('/')
        .ok_or_else(|| Error::Config(format!("import id '{id}' must look like <parent_id>/<child_id>")))?;

    let parse = |part: &str, what: &str| {
        part.trim()
            .parse::<i64>()
            .map_err(|_| Error::Config(format!("unable to parse '{part}' as an int64 number for the {what} id")))
    };

    Ok((parse(parent, "parent")?, parse(child, "child")?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use awx_core::ApiObject;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const HOST_GROUPS: Association = Association::new("host_group", "/api/v2/hosts/{id}/groups/");

    fn listing(ids: &[i64]) -> ApiObject {
        let results: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        match json!({"count": ids.len(), "results": results}) {
            ApiValue::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[test]
    fn endpoint_substitutes_parent() {
        assert_eq!(HOST_GROUPS.endpoint(12), "/api/v2/hosts/12/groups/");
        let bare = Association::new("job_template_credential", "/api/v2/job_templates/{id}/credentials");
        assert_eq!(bare.endpoint(7), "/api/v2/job_templates/7/credentials/");
    }

    #[test]
    fn import_ids() {
        assert_eq!(parse_import_id("12/34").unwrap(), (12, 34));
        assert!(matches!(parse_import_id("12"), Err(Error::Config(_))));
        let err = parse_import_id("12/abc").unwrap_err();
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("child"));
    }

    #[tokio::test]
    async fn associate_posts_child_id() {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(|method, endpoint, body| {
                *method == Method::POST
                    && endpoint == "/api/v2/hosts/12/groups/"
                    && body.as_ref() == Some(&json!({"id": 34, "disassociate": false}))
            })
            .times(1)
            .returning(|_, _, _| Ok(ApiObject::new()));

        HOST_GROUPS.associate(&mock, 12, 34).await.unwrap();
    }

    #[tokio::test]
    async fn disassociate_sets_flag() {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(|_, _, body| body.as_ref() == Some(&json!({"id": 34, "disassociate": true})))
            .times(1)
            .returning(|_, _, _| Ok(ApiObject::new()));

        HOST_GROUPS.disassociate(&mock, 12, 34).await.unwrap();
    }

    #[tokio::test]
    async fn reconcile_applies_difference() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&posted);

        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(|method, _, _| *method == Method::GET)
            .times(1)
            .returning(|_, _, _| Ok(listing(&[1, 2])));
        mock.expect_request()
            .withf(|method, _, _| *method == Method::POST)
            .times(2)
            .returning(move |_, _, body| {
                seen.lock().unwrap().push(body.unwrap());
                Ok(ApiObject::new())
            });

        let desired = BTreeSet::from([2, 3]);
        HOST_GROUPS.reconcile(&mock, 12, &desired).await.unwrap();

        assert_eq!(
            *posted.lock().unwrap(),
            vec![
                json!({"id": 3, "disassociate": false}),
                json!({"id": 1, "disassociate": true}),
            ]
        );
    }

    fn page(count: Option<usize>, ids: &[i64], next: Option<&str>) -> ApiObject {
        let results: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        let mut page = json!({"next": next, "results": results});
        if let Some(count) = count {
            page["count"] = json!(count);
        }
        match page {
            ApiValue::Object(object) => object,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn reconcile_reads_every_page() {
        let posted = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&posted);

        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(|method, endpoint, _| *method == Method::GET && endpoint == "/api/v2/hosts/12/groups/")
            .times(1)
            .returning(|_, _, _| {
                Ok(page(
                    Some(2),
                    &[10],
                    Some("https://awx.example.com/api/v2/hosts/12/groups/?page=2"),
                ))
            });
        mock.expect_request()
            .withf(|method, endpoint, _| {
                *method == Method::GET && endpoint == "/api/v2/hosts/12/groups/?page=2"
            })
            .times(1)
            .returning(|_, _, _| Ok(page(None, &[11], None)));
        mock.expect_request()
            .withf(|method, _, _| *method == Method::POST)
            .times(2)
            .returning(move |_, _, body| {
                seen.lock().unwrap().push(body.unwrap());
                Ok(ApiObject::new())
            });

        HOST_GROUPS.reconcile(&mock, 12, &BTreeSet::new()).await.unwrap();

        assert_eq!(
            *posted.lock().unwrap(),
            vec![
                json!({"id": 10, "disassociate": true}),
                json!({"id": 11, "disassociate": true}),
            ]
        );
    }

    #[tokio::test]
    async fn members_follows_relative_next() {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .withf(|_, endpoint, _| endpoint == "/api/v2/hosts/12/groups/")
            .returning(|_, _, _| Ok(page(Some(3), &[1, 2], Some("/api/v2/hosts/12/groups/?page=2"))));
        mock.expect_request()
            .withf(|_, endpoint, _| endpoint == "/api/v2/hosts/12/groups/?page=2")
            .returning(|_, _, _| Ok(page(Some(3), &[3], None)));

        let members = HOST_GROUPS.members(&mock, 12).await.unwrap();
        assert_eq!(members, BTreeSet::from([1, 2, 3]));
    }

    #[tokio::test]
    async fn members_rejects_short_listing() {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .returning(|_, _, _| Ok(page(Some(30), &[1, 2], None)));

        let err = HOST_GROUPS.members(&mock, 12).await.unwrap_err();
        assert!(matches!(err, Error::Decode(ref message) if message.contains("reported 30")));
    }

    #[tokio::test]
    async fn members_rejects_non_listing() {
        let mut mock = MockTransport::new();
        mock.expect_request()
            .returning(|_, _, _| Ok(ApiObject::new()));

        let err = HOST_GROUPS.members(&mock, 12).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
