//! Search resolution.
//!
//! Object types declare one or more lookup groups, for example "by id" and
//! "by name scoped to an organization". [`resolve`] picks the first group
//! whose parameters are all known in the configuration and renders the
//! endpoint to fetch.

use awx_core::{AttributeSet, Error, QueryParams, Result};
use std::fmt;

/// How a group's values are placed in the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupStyle {
    /// Values become path segments: `<base>/<value>/`
    Path,
    /// Values become query filters: `<base>/?<key>=<value>`
    Query,
}

/// How a query parameter matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// `<field>__exact=<value>`
    Exact,
    /// `<field>=<value>`
    Equals,
}

/// One required attribute of a lookup group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupParam {
    /// Attribute name, also used as the query field
    pub attribute: &'static str,
    /// Match mode for query style groups
    pub filter: Filter,
}

/// A named lookup strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupGroup {
    /// Group name, used in diagnostics
    pub name: &'static str,
    /// Endpoint style
    pub style: LookupStyle,
    /// Required attributes in rendering order
    pub params: Vec<LookupParam>,
}

impl LookupGroup {
    /// An empty group.
    #[must_use]
    pub const fn new(name: &'static str, style: LookupStyle) -> Self {
        Self {
            name,
            style,
            params: Vec::new(),
        }
    }

    /// Append an exact-match parameter.
    #[must_use]
    pub fn exact(mut self, attribute: &'static str) -> Self {
        self.params.push(LookupParam {
            attribute,
            filter: Filter::Exact,
        });
        self
    }

    /// Append a plain equality parameter.
    #[must_use]
    pub fn equals(mut self, attribute: &'static str) -> Self {
        self.params.push(LookupParam {
            attribute,
            filter: Filter::Equals,
        });
        self
    }

    /// `<base>/<id>/`
    #[must_use]
    pub fn by_id() -> Self {
        Self::new("by_id", LookupStyle::Path).equals("id")
    }

    /// `<base>/?name__exact=<name>`
    #[must_use]
    pub fn by_name() -> Self {
        Self::new("by_name", LookupStyle::Query).exact("name")
    }

    /// `<base>/?name__exact=<name>&<parent>=<parent id>`
    #[must_use]
    pub fn by_name_scoped(name: &'static str, parent: &'static str) -> Self {
        Self::new(name, LookupStyle::Query).exact("name").equals(parent)
    }

    /// `<base>/?username__exact=<username>`
    #[must_use]
    pub fn by_username() -> Self {
        Self::new("by_username", LookupStyle::Query).exact("username")
    }

    /// Returns true if every parameter is known and scalar.
    #[must_use]
    pub fn is_satisfied(&self, config: &AttributeSet) -> bool {
        !self.params.is_empty() && self.values(config).is_some()
    }

    fn values(&self, config: &AttributeSet) -> Option<Vec<(LookupParam, String)>> {
        self.params
            .iter()
            .map(|param| {
                config
                    .get(param.attribute)
                    .and_then(awx_core::AttrValue::to_scalar_text)
                    .map(|value| (*param, value))
            })
            .collect()
    }

    fn render(&self, base: &str, values: &[(LookupParam, String)]) -> String {
        let base = base.trim_end_matches('/');
        match self.style {
            LookupStyle::Path => {
                let segments: Vec<String> = values
                    .iter()
                    .map(|(_, value)| urlencoding::encode(value).into_owned())
                    .collect();
                format!("{base}/{}/", segments.join("/"))
            }
            LookupStyle::Query => {
                let mut query = QueryParams::new();
                for (param, value) in values {
                    match param.filter {
                        Filter::Exact => query.push_exact(param.attribute, value),
                        Filter::Equals => query.push(param.attribute, value),
                    }
                }
                format!("{base}/?{}", query.to_query_string())
            }
        }
    }
}

impl fmt::Display for LookupGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.params.iter().map(|p| p.attribute).collect();
        write!(f, "{} [{}]", self.name, names.join(", "))
    }
}

/// The endpoint chosen by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Name of the winning group
    pub group: &'static str,
    /// Style of the winning group; query lookups answer with a search envelope
    pub style: LookupStyle,
    /// Path and query to request
    pub endpoint: String,
}

/// Pick the first satisfied lookup group and render its endpoint.
///
/// Groups are tried in declaration order and the first one whose
/// attributes are all known wins, even if later groups are satisfied too.
/// Mutual exclusivity is enforced by schema validation before this point.
///
/// # Errors
///
/// Returns [`Error::Resolution`] if no group is satisfied.
pub fn resolve(base: &str, groups: &[LookupGroup], config: &AttributeSet) -> Result<ResolvedEndpoint> {
    for group in groups {
        if group.params.is_empty() {
            continue;
        }
        if let Some(values) = group.values(config) {
            return Ok(ResolvedEndpoint {
                group: group.name,
                style: group.style,
                endpoint: group.render(base, &values),
            });
        }
    }

    let options: Vec<String> = groups.iter().map(ToString::to_string).collect();
    Err(Error::Resolution(format!(
        "no identifying attributes supplied for {base}, set one of: {}",
        options.join("; ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use awx_core::{AttrValue, TypedAttribute};

    fn groups() -> Vec<LookupGroup> {
        vec![
            LookupGroup::by_id(),
            LookupGroup::by_name_scoped("by_name_organization", "organization"),
            LookupGroup::by_name(),
        ]
    }

    #[test]
    fn id_wins_over_name() {
        let config = AttributeSet::new()
            .with("id", AttrValue::int64(42))
            .with("name", AttrValue::string("ops"));
        let resolved = resolve("/objects/", &groups(), &config).unwrap();
        assert_eq!(resolved.endpoint, "/objects/42/");
        assert_eq!(resolved.group, "by_id");
        assert_eq!(resolved.style, LookupStyle::Path);
    }

    #[test]
    fn scoped_name_builds_query() {
        let config = AttributeSet::new()
            .with("id", AttrValue::Int64(TypedAttribute::Null))
            .with("name", AttrValue::string("ops"))
            .with("organization", AttrValue::int64(3));
        let resolved = resolve("/api/v2/teams/", &groups(), &config).unwrap();
        assert_eq!(resolved.endpoint, "/api/v2/teams/?name__exact=ops&organization=3");
        assert_eq!(resolved.group, "by_name_organization");
    }

    #[test]
    fn name_alone_falls_through() {
        let config = AttributeSet::new()
            .with("name", AttrValue::string("web servers"))
            .with("organization", AttrValue::Int64(TypedAttribute::Unknown));
        let resolved = resolve("/api/v2/inventories/", &groups(), &config).unwrap();
        assert_eq!(resolved.endpoint, "/api/v2/inventories/?name__exact=web%20servers");
    }

    #[test]
    fn path_values_are_escaped() {
        let groups = vec![LookupGroup::new("by_slug", LookupStyle::Path).equals("slug")];
        let config = AttributeSet::new().with("slug", AttrValue::string("a/b c"));
        let resolved = resolve("/api/v2/things", &groups, &config).unwrap();
        assert_eq!(resolved.endpoint, "/api/v2/things/a%2Fb%20c/");
    }

    #[test]
    fn unknown_and_null_do_not_satisfy() {
        let config = AttributeSet::new()
            .with("id", AttrValue::Int64(TypedAttribute::Unknown))
            .with("name", AttrValue::String(TypedAttribute::Null));
        let err = resolve("/api/v2/teams/", &groups(), &config).unwrap_err();
        assert!(matches!(err, Error::Resolution(ref message) if message.contains("by_id [id]")));
    }

    #[test]
    fn empty_group_list_fails() {
        let err = resolve("/api/v2/teams/", &[], &AttributeSet::new()).unwrap_err();
        assert!(matches!(err, Error::Resolution(_)));
    }

    #[test]
    fn username_lookup() {
        let config = AttributeSet::new().with("username", AttrValue::string("admin"));
        assert!(LookupGroup::by_username().is_satisfied(&config));
        assert!(!LookupGroup::by_name().is_satisfied(&config));
        let resolved = resolve("/api/v2/users/", &[LookupGroup::by_username()], &config).unwrap();
        assert_eq!(resolved.endpoint, "/api/v2/users/?username__exact=admin");
    }
}
