//! Convenience builder for lookup query strings.
//!
//! AWX filters collections with `?<field>=<value>` pairs; exact matches use
//! the `<field>__exact` suffix. Values are percent-encoded here so callers
//! can pass raw attribute text.

use std::fmt::Display;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Display,
    {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Append an exact-match filter, `<field>__exact=<value>`.
    pub fn push_exact<T>(&mut self, field: &str, value: T)
    where
        T: Display,
    {
        self.push(format!("{field}__exact"), value);
    }

    /// Render as `key=value&...`, percent-encoding keys and values.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::QueryParams;

    #[test]
    fn exact_filter_uses_suffix() {
        let mut params = QueryParams::new();
        params.push_exact("name", "ops");
        params.push("organization", 3);
        assert_eq!(params.to_query_string(), "name__exact=ops&organization=3");
    }

    #[test]
    fn values_are_percent_encoded() {
        let mut params = QueryParams::new();
        params.push_exact("name", "a b/c&d");
        assert_eq!(params.to_query_string(), "name__exact=a%20b%2Fc%26d");
    }
}
