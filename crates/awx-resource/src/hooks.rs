//! Post-decode hooks.
//!
//! Hooks reconcile freshly decoded state with what the caller already knew.
//! AWX never returns secrets: it answers `$encrypted$` instead, and hooks
//! put the caller's values back so the state does not drift on every read.
//! Everything a hook needs is passed in through [`CallContext`].

use crate::marshal::{canonical_json, canonicalize};
use crate::schema::{AttributeKind, ResourceSchema};
use awx_core::{ApiObject, ApiValue, AttrValue, AttributeSet, Error, Result, TypedAttribute};
use serde::Serialize;
use std::fmt;

/// Placeholder AWX returns in place of secret values.
pub const ENCRYPTED_MARKER: &str = "$encrypted$";

/// Which kind of caller triggered an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Read-only lookup of an existing object
    DataSource,
    /// Managed object with a lifecycle
    Resource,
}

/// Which lifecycle operation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// Create
    Create,
    /// Read
    Read,
    /// Update
    Update,
    /// Delete
    Delete,
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Per-call context handed to every hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallContext {
    /// Server API version, as reported by `/api/v2/ping/`
    pub api_version: String,
    /// Caller kind
    pub source: Source,
    /// Running operation
    pub callee: Callee,
}

impl CallContext {
    /// Create a context.
    #[must_use]
    pub fn new(api_version: impl Into<String>, source: Source, callee: Callee) -> Self {
        Self {
            api_version: api_version.into(),
            source,
            callee,
        }
    }

    /// Same context for another operation.
    #[must_use]
    pub fn with_callee(mut self, callee: Callee) -> Self {
        self.callee = callee;
        self
    }

    /// Same context for another caller kind.
    #[must_use]
    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    fn is_resource(&self, callees: &[Callee]) -> bool {
        self.source == Source::Resource && callees.contains(&self.callee)
    }
}

/// A post-decode hook.
///
/// `prior` is the caller's plan on create and update, and the previously
/// stored state on read. `state` is the freshly decoded object.
pub type Hook =
    fn(&CallContext, &ResourceSchema, Option<&AttributeSet>, &mut AttributeSet) -> Result<()>;

/// Run the schema's hooks in declaration order, stopping at the first error.
///
/// # Errors
///
/// Returns the first hook error.
pub fn run_hooks(
    ctx: &CallContext,
    schema: &ResourceSchema,
    prior: Option<&AttributeSet>,
    state: &mut AttributeSet,
) -> Result<()> {
    for hook in &schema.hooks {
        hook(ctx, schema, prior, state)?;
    }
    Ok(())
}

/// Reject resource reads and updates that arrive without prior state.
///
/// # Errors
///
/// Returns [`Error::Hook`] when the prior state is missing or empty.
pub fn require_prior_state(
    ctx: &CallContext,
    schema: &ResourceSchema,
    prior: Option<&AttributeSet>,
    _state: &mut AttributeSet,
) -> Result<()> {
    if ctx.is_resource(&[Callee::Read, Callee::Update]) && prior.map_or(true, AttributeSet::is_empty) {
        return Err(Error::Hook(format!(
            "{} {}: prior state is required",
            schema.type_name, ctx.callee
        )));
    }
    Ok(())
}

/// Keep the caller's values for attributes the server will not reveal.
///
/// On create every write-only attribute takes the planned value. On read
/// and update, write-only attributes and string attributes the server
/// answered with `$encrypted$` take the prior value when it is not null.
///
/// # Errors
///
/// Never fails.
pub fn preserve_write_only(
    ctx: &CallContext,
    schema: &ResourceSchema,
    prior: Option<&AttributeSet>,
    state: &mut AttributeSet,
) -> Result<()> {
    let Some(prior) = prior else {
        return Ok(());
    };

    for spec in &schema.attributes {
        let Some(previous) = prior.get(spec.name) else {
            continue;
        };

        let restore = if ctx.is_resource(&[Callee::Create]) {
            spec.is_sensitive()
        } else if ctx.is_resource(&[Callee::Read, Callee::Update]) {
            let masked = spec.kind == AttributeKind::String
                && state
                    .get_string(spec.name)
                    .and_then(TypedAttribute::known)
                    .is_some_and(|value| value == ENCRYPTED_MARKER);
            (spec.is_sensitive() || masked) && !previous.is_null()
        } else {
            false
        };

        if restore {
            state.insert(spec.name, previous.clone());
        }
    }

    Ok(())
}

/// Restore `$encrypted$` entries inside structured text attributes.
///
/// Applies to JSON and JSON/YAML attributes. On create the planned text is
/// kept as is. On read and update every top-level entry whose string value
/// contains `$encrypted$` is replaced by the prior entry with the same key.
///
/// # Errors
///
/// Returns [`Error::Hook`] if either side is not a JSON or YAML mapping, or
/// if an encrypted key has no prior value.
pub fn preserve_encrypted_json(
    ctx: &CallContext,
    schema: &ResourceSchema,
    prior: Option<&AttributeSet>,
    state: &mut AttributeSet,
) -> Result<()> {
    let Some(prior) = prior else {
        return Ok(());
    };

    let structured = schema.attributes.iter().filter(|spec| {
        matches!(spec.kind, AttributeKind::JsonText | AttributeKind::JsonYamlText)
    });

    for spec in structured {
        let previous = prior.get_string(spec.name).and_then(TypedAttribute::known);

        if ctx.is_resource(&[Callee::Create]) {
            if let Some(previous) = previous {
                state.insert(spec.name, AttrValue::string(previous.as_str()));
            }
            continue;
        }
        if !ctx.is_resource(&[Callee::Read, Callee::Update]) {
            continue;
        }

        let Some(current) = state.get_string(spec.name).and_then(TypedAttribute::known) else {
            continue;
        };
        if !current.contains(ENCRYPTED_MARKER) {
            continue;
        }
        let Some(previous) = previous else {
            continue;
        };

        let merged = restore_encrypted(spec.name, current, previous)?;
        state.insert(spec.name, AttrValue::string(merged));
    }

    Ok(())
}

fn parse_object(attribute: &str, text: &str, side: &str) -> Result<ApiObject> {
    let canonical = canonicalize(text)
        .map_err(|e| Error::Hook(format!("attribute `{attribute}`: {side} value: {e}")))?;
    if canonical.is_empty() {
        return Ok(ApiObject::new());
    }
    match serde_json::from_str::<ApiValue>(&canonical) {
        Ok(ApiValue::Object(object)) => Ok(object),
        Ok(_) => Err(Error::Hook(format!(
            "attribute `{attribute}`: {side} value is not a mapping"
        ))),
        Err(e) => Err(Error::Hook(format!("attribute `{attribute}`: {side} value: {e}"))),
    }
}

fn restore_encrypted(attribute: &str, current: &str, previous: &str) -> Result<String> {
    let mut current = parse_object(attribute, current, "new")?;
    let previous = parse_object(attribute, previous, "prior")?;

    let mut missing = Vec::new();
    for (key, value) in &mut current {
        let encrypted = value.as_str().is_some_and(|s| s.contains(ENCRYPTED_MARKER));
        if !encrypted {
            continue;
        }
        match previous.get(key) {
            Some(prior_value) => *value = prior_value.clone(),
            None => missing.push(key.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(Error::Hook(format!(
            "attribute `{attribute}`: encrypted keys [{}] not found in prior state",
            missing.join(", ")
        )));
    }

    Ok(canonical_json(&ApiValue::Object(current)))
}
