//! Declarative object tables.
//!
//! A [`ResourceSchema`] describes one AWX object type: where it lives, which
//! attributes it has and how each one travels over the wire, how it can be
//! looked up, and which hooks reconcile a fresh read with prior state. The
//! engine is generic; everything type specific is data in these tables.

use crate::hooks::Hook;
use crate::resolve::LookupGroup;
use awx_client::Method;
use awx_core::{AttrValue, AttributeSet, Diagnostic, Diagnostics, TypedAttribute};
use std::fmt;

/// Wire and engine representation of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Plain string
    String,
    /// 64-bit integer
    Int64,
    /// Boolean
    Bool,
    /// 64-bit float
    Float64,
    /// List of strings
    ListString,
    /// Map of strings
    MapString,
    /// Structured value held as canonical JSON text, sent as raw JSON
    JsonText,
    /// Structured value written as JSON or YAML text, sent as a JSON string
    JsonYamlText,
}

impl AttributeKind {
    /// Name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Bool => "bool",
            Self::Float64 => "float64",
            Self::ListString => "list of strings",
            Self::MapString => "map of strings",
            Self::JsonText => "JSON value",
            Self::JsonYamlText => "JSON or YAML mapping",
        }
    }

    /// A `Null` value of the matching engine type.
    #[must_use]
    pub fn null_value(self) -> AttrValue {
        match self {
            Self::String | Self::JsonText | Self::JsonYamlText => {
                AttrValue::String(TypedAttribute::Null)
            }
            Self::Int64 => AttrValue::Int64(TypedAttribute::Null),
            Self::Bool => AttrValue::Bool(TypedAttribute::Null),
            Self::Float64 => AttrValue::Float64(TypedAttribute::Null),
            Self::ListString => AttrValue::List(TypedAttribute::Null),
            Self::MapString => AttrValue::Map(TypedAttribute::Null),
        }
    }

    /// An `Unknown` value of the matching engine type.
    #[must_use]
    pub fn unknown_value(self) -> AttrValue {
        match self {
            Self::String | Self::JsonText | Self::JsonYamlText => {
                AttrValue::String(TypedAttribute::Unknown)
            }
            Self::Int64 => AttrValue::Int64(TypedAttribute::Unknown),
            Self::Bool => AttrValue::Bool(TypedAttribute::Unknown),
            Self::Float64 => AttrValue::Float64(TypedAttribute::Unknown),
            Self::ListString => AttrValue::List(TypedAttribute::Unknown),
            Self::MapString => AttrValue::Map(TypedAttribute::Unknown),
        }
    }

    /// Returns true if values of this kind are held as strings.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::JsonText | Self::JsonYamlText)
    }

    /// Returns true if the engine value has the variant this kind uses.
    #[must_use]
    pub const fn accepts(self, value: &AttrValue) -> bool {
        matches!(
            (self, value),
            (Self::String | Self::JsonText | Self::JsonYamlText, AttrValue::String(_))
                | (Self::Int64, AttrValue::Int64(_))
                | (Self::Bool, AttrValue::Bool(_))
                | (Self::Float64, AttrValue::Float64(_))
                | (Self::ListString, AttrValue::List(_))
                | (Self::MapString, AttrValue::Map(_))
        )
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read/write classification of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Computed by the server, never sent
    ReadOnly,
    /// Sent on write and read back
    Writable,
    /// Sent on write, never read back from the server
    WriteOnlySensitive,
}

/// Declaration of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Attribute name, identical to the API field name
    pub name: &'static str,
    /// Wire kind
    pub kind: AttributeKind,
    /// Read/write classification
    pub access: Access,
    /// Leave the field out of write payloads when it has no value
    pub omit_if_empty: bool,
    /// Trim surrounding whitespace from strings read from the server
    pub trim: bool,
    /// Must be set when the object is created
    pub required_on_create: bool,
}

impl AttributeSpec {
    /// A writable attribute of the given kind.
    #[must_use]
    pub const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            access: Access::Writable,
            omit_if_empty: false,
            trim: false,
            required_on_create: false,
        }
    }

    /// Mark as computed by the server.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.access = Access::ReadOnly;
        self
    }

    /// Mark as write-only and sensitive.
    #[must_use]
    pub const fn sensitive(mut self) -> Self {
        self.access = Access::WriteOnlySensitive;
        self
    }

    /// Omit from write payloads when null or unknown.
    #[must_use]
    pub const fn omit_if_empty(mut self) -> Self {
        self.omit_if_empty = true;
        self
    }

    /// Trim whitespace on decode.
    #[must_use]
    pub const fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    /// Require a value on create.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required_on_create = true;
        self
    }

    /// Returns true if the attribute is sent to the server.
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        !matches!(self.access, Access::ReadOnly)
    }

    /// Returns true if the attribute is write-only and sensitive.
    #[must_use]
    pub const fn is_sensitive(&self) -> bool {
        matches!(self.access, Access::WriteOnlySensitive)
    }
}

/// HTTP method used for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMethod {
    /// Partial update
    #[default]
    Patch,
    /// Full replacement
    Put,
}

impl UpdateMethod {
    /// The HTTP method.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Patch => Method::PATCH,
            Self::Put => Method::PUT,
        }
    }
}

/// Declaration of one AWX object type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Human readable type name, e.g. `Host`
    pub type_name: &'static str,
    /// Collection endpoint, e.g. `/api/v2/hosts/`
    pub endpoint: &'static str,
    /// Attribute holding the object id
    pub id_attribute: &'static str,
    /// Attributes in declaration order
    pub attributes: Vec<AttributeSpec>,
    /// Lookup strategies in precedence order
    pub lookup_groups: Vec<LookupGroup>,
    /// Attribute sets of which exactly one member must be configured for a lookup
    pub exactly_one_of: Vec<Vec<&'static str>>,
    /// Method used for updates
    pub update_method: UpdateMethod,
    /// A single settings object with no id and no delete
    pub singleton: bool,
    /// Hooks run after every decode
    pub hooks: Vec<Hook>,
}

impl ResourceSchema {
    /// Start a schema for the given type and collection endpoint.
    #[must_use]
    pub fn new(type_name: &'static str, endpoint: &'static str) -> Self {
        Self {
            type_name,
            endpoint,
            id_attribute: "id",
            attributes: Vec::new(),
            lookup_groups: Vec::new(),
            exactly_one_of: Vec::new(),
            update_method: UpdateMethod::Patch,
            singleton: false,
            hooks: Vec::new(),
        }
    }

    /// Append an attribute.
    #[must_use]
    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.push(spec);
        self
    }

    /// Append a lookup group.
    #[must_use]
    pub fn lookup(mut self, group: LookupGroup) -> Self {
        self.lookup_groups.push(group);
        self
    }

    /// Require exactly one of the given attributes to be configured.
    #[must_use]
    pub fn exactly_one_of(mut self, names: &[&'static str]) -> Self {
        self.exactly_one_of.push(names.to_vec());
        self
    }

    /// Set the update method.
    #[must_use]
    pub const fn with_update_method(mut self, method: UpdateMethod) -> Self {
        self.update_method = method;
        self
    }

    /// Mark as a singleton settings object.
    #[must_use]
    pub const fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    /// Append a hook.
    #[must_use]
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Look up an attribute declaration.
    #[must_use]
    pub fn attribute_spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.name == name)
    }

    /// Endpoint of a single object.
    ///
    /// The id is percent-encoded. Singletons live at the collection
    /// endpoint itself.
    #[must_use]
    pub fn object_endpoint(&self, id: &str) -> String {
        if self.singleton {
            return self.endpoint.to_string();
        }
        format!(
            "{}/{}/",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(id)
        )
    }

    /// Textual id of an object, if the id attribute is known.
    #[must_use]
    pub fn id_of(&self, state: &AttributeSet) -> Option<String> {
        state.get(self.id_attribute)?.to_scalar_text()
    }

    /// Check the exactly-one-of constraints on a lookup configuration.
    ///
    /// Unknown values count as set: they will be resolved by the engine
    /// later and cannot be judged yet.
    #[must_use]
    pub fn validate_config(&self, config: &AttributeSet) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        for group in &self.exactly_one_of {
            let unknown = group
                .iter()
                .any(|name| config.get(name).is_some_and(AttrValue::is_unknown));
            if unknown {
                continue;
            }
            let set: Vec<&str> = group
                .iter()
                .copied()
                .filter(|name| config.is_known(name))
                .collect();
            if set.len() != 1 {
                let expected = group.join(", ");
                let detail = if set.is_empty() {
                    format!("none of [{expected}] is set")
                } else {
                    format!("[{}] are all set", set.join(", "))
                };
                diagnostics.push(Diagnostic::error(
                    format!("Exactly one of [{expected}] must be configured"),
                    detail,
                ));
            }
        }

        diagnostics
    }

    /// Check that a plan carries every attribute required on create.
    #[must_use]
    pub fn validate_create(&self, plan: &AttributeSet) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        for spec in self.attributes.iter().filter(|spec| spec.required_on_create) {
            let missing = plan.get(spec.name).map_or(true, AttrValue::is_null);
            if missing {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Missing required attribute for {}", self.type_name),
                        format!("`{}` must be set to create a {}", spec.name, self.type_name),
                    )
                    .with_attribute(spec.name),
                );
            }
        }

        diagnostics
    }
}
