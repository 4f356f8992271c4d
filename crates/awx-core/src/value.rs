//! Typed attribute values.
//!
//! Values decoded from the wire are plain [`ApiValue`]s; absence of a key is
//! modelled as `None` wherever a value is looked up. Values held by the
//! configuration engine are [`TypedAttribute`]s, which distinguish
//! unresolved (`Unknown`), explicitly absent (`Null`) and present (`Known`)
//! values for each supported primitive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value decoded from a JSON response body.
pub type ApiValue = serde_json::Value;

/// A decoded JSON object.
pub type ApiObject = serde_json::Map<String, ApiValue>;

/// Returns a short name for the JSON shape of a value, used in diagnostics.
#[must_use]
pub fn shape_of(value: &ApiValue) -> &'static str {
    match value {
        ApiValue::Null => "null",
        ApiValue::Bool(_) => "bool",
        ApiValue::Number(n) if n.is_f64() => "float",
        ApiValue::Number(_) => "integer",
        ApiValue::String(_) => "string",
        ApiValue::Array(_) => "array",
        ApiValue::Object(_) => "object",
    }
}

/// Engine-side value of a single attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum TypedAttribute<T> {
    /// Not yet resolved by the engine (plan-time placeholder)
    Unknown,
    /// Explicitly absent
    #[default]
    Null,
    /// Present with a value
    Known(T),
}

impl<T> TypedAttribute<T> {
    /// Returns true if the value is unresolved.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns true if the value is explicitly absent.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value is present.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the known value.
    #[must_use]
    pub const fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Take the known value.
    #[must_use]
    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Map the known value, keeping `Unknown` and `Null` as they are.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> TypedAttribute<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Unknown => TypedAttribute::Unknown,
            Self::Null => TypedAttribute::Null,
            Self::Known(value) => TypedAttribute::Known(f(value)),
        }
    }
}

impl<T: Default + Clone> TypedAttribute<T> {
    /// The known value, or the type's zero value for `Unknown` and `Null`.
    #[must_use]
    pub fn value_or_default(&self) -> T {
        self.known().cloned().unwrap_or_default()
    }
}

impl<T> From<Option<T>> for TypedAttribute<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Known)
    }
}

/// Type-erased attribute value, one variant per supported primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttrValue {
    /// UTF-8 string
    String(TypedAttribute<String>),
    /// 64-bit signed integer
    Int64(TypedAttribute<i64>),
    /// Boolean
    Bool(TypedAttribute<bool>),
    /// 64-bit float
    Float64(TypedAttribute<f64>),
    /// Ordered list of strings
    List(TypedAttribute<Vec<String>>),
    /// String-keyed map of strings
    Map(TypedAttribute<BTreeMap<String, String>>),
}

impl AttrValue {
    /// Known string value.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(TypedAttribute::Known(value.into()))
    }

    /// Known integer value.
    #[must_use]
    pub const fn int64(value: i64) -> Self {
        Self::Int64(TypedAttribute::Known(value))
    }

    /// Known boolean value.
    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::Bool(TypedAttribute::Known(value))
    }

    /// Known float value.
    #[must_use]
    pub const fn float64(value: f64) -> Self {
        Self::Float64(TypedAttribute::Known(value))
    }

    /// Known list value.
    #[must_use]
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(TypedAttribute::Known(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Known map value.
    #[must_use]
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(TypedAttribute::Known(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Name of the primitive held by this value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int64(_) => "int64",
            Self::Bool(_) => "bool",
            Self::Float64(_) => "float64",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Returns true if the value is unresolved.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        match self {
            Self::String(v) => v.is_unknown(),
            Self::Int64(v) => v.is_unknown(),
            Self::Bool(v) => v.is_unknown(),
            Self::Float64(v) => v.is_unknown(),
            Self::List(v) => v.is_unknown(),
            Self::Map(v) => v.is_unknown(),
        }
    }

    /// Returns true if the value is explicitly absent.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::String(v) => v.is_null(),
            Self::Int64(v) => v.is_null(),
            Self::Bool(v) => v.is_null(),
            Self::Float64(v) => v.is_null(),
            Self::List(v) => v.is_null(),
            Self::Map(v) => v.is_null(),
        }
    }

    /// Returns true if the value is present.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !self.is_unknown() && !self.is_null()
    }

    /// Borrow as a string attribute.
    #[must_use]
    pub const fn as_string(&self) -> Option<&TypedAttribute<String>> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as an integer attribute.
    #[must_use]
    pub const fn as_int64(&self) -> Option<&TypedAttribute<i64>> {
        match self {
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a boolean attribute.
    #[must_use]
    pub const fn as_bool(&self) -> Option<&TypedAttribute<bool>> {
        match self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a float attribute.
    #[must_use]
    pub const fn as_float64(&self) -> Option<&TypedAttribute<f64>> {
        match self {
            Self::Float64(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a list attribute.
    #[must_use]
    pub const fn as_list(&self) -> Option<&TypedAttribute<Vec<String>>> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow as a map attribute.
    #[must_use]
    pub const fn as_map(&self) -> Option<&TypedAttribute<BTreeMap<String, String>>> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Literal JSON representation of a known value.
    ///
    /// Returns `None` for `Unknown` and `Null`.
    #[must_use]
    pub fn to_api_value(&self) -> Option<ApiValue> {
        match self {
            Self::String(v) => v.known().map(|s| ApiValue::from(s.as_str())),
            Self::Int64(v) => v.known().map(|n| ApiValue::from(*n)),
            Self::Bool(v) => v.known().map(|b| ApiValue::from(*b)),
            Self::Float64(v) => v.known().map(|f| ApiValue::from(*f)),
            Self::List(v) => v
                .known()
                .map(|items| ApiValue::Array(items.iter().map(|s| ApiValue::from(s.as_str())).collect())),
            Self::Map(v) => v.known().map(|entries| {
                ApiValue::Object(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), ApiValue::from(v.as_str())))
                        .collect(),
                )
            }),
        }
    }

    /// Textual form of a known scalar, for use in request paths and queries.
    ///
    /// Lists, maps and unresolved values have no textual form.
    #[must_use]
    pub fn to_scalar_text(&self) -> Option<String> {
        match self {
            Self::String(v) => v.known().cloned(),
            Self::Int64(v) => v.known().map(ToString::to_string),
            Self::Bool(v) => v.known().map(ToString::to_string),
            Self::Float64(v) => v.known().map(ToString::to_string),
            Self::List(_) | Self::Map(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return write!(f, "<unknown>");
        }
        match self.to_api_value() {
            Some(value) => write!(f, "{value}"),
            None => write!(f, "<null>"),
        }
    }
}

/// Attribute values of one resource instance, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet {
    values: BTreeMap<String, AttrValue>,
}

impl AttributeSet {
    /// Create an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) -> Option<AttrValue> {
        self.values.insert(name.into(), value)
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.values.remove(name)
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    /// Returns true if the attribute is present with a known value.
    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.get(name).is_some_and(AttrValue::is_known)
    }

    /// Look up a string attribute.
    #[must_use]
    pub fn get_string(&self, name: &str) -> Option<&TypedAttribute<String>> {
        self.get(name).and_then(AttrValue::as_string)
    }

    /// Look up an integer attribute.
    #[must_use]
    pub fn get_int64(&self, name: &str) -> Option<&TypedAttribute<i64>> {
        self.get(name).and_then(AttrValue::as_int64)
    }

    /// Look up a boolean attribute.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<&TypedAttribute<bool>> {
        self.get(name).and_then(AttrValue::as_bool)
    }

    /// Iterate in attribute-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AttrValue)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, AttrValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_attribute_states() {
        let unknown: TypedAttribute<i64> = TypedAttribute::Unknown;
        assert!(unknown.is_unknown());
        assert!(!unknown.is_known());
        assert_eq!(unknown.known(), None);

        let null: TypedAttribute<i64> = TypedAttribute::default();
        assert!(null.is_null());
        assert_eq!(null.value_or_default(), 0);

        let known = TypedAttribute::Known(7_i64);
        assert_eq!(known.known(), Some(&7));
        assert_eq!(known.clone().map(|v| v * 2), TypedAttribute::Known(14));
        assert_eq!(known.into_known(), Some(7));
    }

    #[test]
    fn typed_attribute_from_option() {
        assert_eq!(
            TypedAttribute::from(Some("x".to_string())),
            TypedAttribute::Known("x".to_string())
        );
        assert_eq!(TypedAttribute::<String>::from(None), TypedAttribute::Null);
    }

    #[test]
    fn attr_value_known_json() {
        assert_eq!(AttrValue::string("ops").to_api_value(), Some(json!("ops")));
        assert_eq!(AttrValue::int64(42).to_api_value(), Some(json!(42)));
        assert_eq!(AttrValue::boolean(false).to_api_value(), Some(json!(false)));
        assert_eq!(AttrValue::float64(1.5).to_api_value(), Some(json!(1.5)));
        assert_eq!(
            AttrValue::list(["a", "b"]).to_api_value(),
            Some(json!(["a", "b"]))
        );
        assert_eq!(
            AttrValue::map([("k", "v")]).to_api_value(),
            Some(json!({"k": "v"}))
        );
        assert_eq!(AttrValue::Int64(TypedAttribute::Null).to_api_value(), None);
        assert_eq!(AttrValue::Int64(TypedAttribute::Unknown).to_api_value(), None);
    }

    #[test]
    fn attr_value_scalar_text() {
        assert_eq!(AttrValue::int64(42).to_scalar_text().as_deref(), Some("42"));
        assert_eq!(AttrValue::string("a b").to_scalar_text().as_deref(), Some("a b"));
        assert_eq!(AttrValue::boolean(true).to_scalar_text().as_deref(), Some("true"));
        assert_eq!(AttrValue::list(["a"]).to_scalar_text(), None);
        assert_eq!(AttrValue::String(TypedAttribute::Unknown).to_scalar_text(), None);
    }

    #[test]
    fn attr_value_display() {
        assert_eq!(AttrValue::string("ops").to_string(), "\"ops\"");
        assert_eq!(AttrValue::Bool(TypedAttribute::Null).to_string(), "<null>");
        assert_eq!(AttrValue::Bool(TypedAttribute::Unknown).to_string(), "<unknown>");
    }

    #[test]
    fn attribute_set_lookups() {
        let set = AttributeSet::new()
            .with("id", AttrValue::int64(1))
            .with("name", AttrValue::String(TypedAttribute::Unknown));

        assert!(set.is_known("id"));
        assert!(!set.is_known("name"));
        assert!(!set.is_known("missing"));
        assert_eq!(set.get_int64("id"), Some(&TypedAttribute::Known(1)));
        assert_eq!(set.get_string("id"), None);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn shapes() {
        assert_eq!(shape_of(&json!(null)), "null");
        assert_eq!(shape_of(&json!(1)), "integer");
        assert_eq!(shape_of(&json!(1.5)), "float");
        assert_eq!(shape_of(&json!({})), "object");
        assert_eq!(shape_of(&json!([])), "array");
    }
}
