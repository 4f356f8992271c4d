//! Attribute marshaling.
//!
//! Converts untyped JSON from the wire into typed attribute values and back.
//! Decoding is fail-soft: a field with the wrong shape becomes `Null` and a
//! diagnostic, and the remaining fields are still decoded.

use crate::schema::{AttributeKind, AttributeSpec, ResourceSchema};
use awx_core::value::shape_of;
use awx_core::{
    ApiObject, ApiValue, AttrValue, AttributeSet, Diagnostics, Error, Result, TypedAttribute,
};
use std::collections::BTreeMap;

/// Decode one attribute from the value found under its key.
///
/// Absent and JSON `null` both decode to `Null`. Sensitive attributes never
/// take the server's value: they decode to `Null` when the key is empty and
/// to an empty string otherwise.
pub fn decode(spec: &AttributeSpec, raw: Option<&ApiValue>, diagnostics: &mut Diagnostics) -> AttrValue {
    let raw = match raw {
        None | Some(ApiValue::Null) => return spec.kind.null_value(),
        Some(raw) => raw,
    };

    if spec.is_sensitive() {
        return if spec.kind.is_textual() {
            AttrValue::string("")
        } else {
            spec.kind.null_value()
        };
    }

    match convert(spec, raw) {
        Ok(value) => value,
        Err(err) => {
            diagnostics.push(err.into_diagnostic(format!("Unable to decode attribute `{}`", spec.name)));
            spec.kind.null_value()
        }
    }
}

fn mismatch(spec: &AttributeSpec, found: impl Into<String>) -> Error {
    Error::FieldConversion {
        attribute: spec.name.to_string(),
        expected: spec.kind.name().to_string(),
        found: found.into(),
    }
}

fn convert(spec: &AttributeSpec, raw: &ApiValue) -> Result<AttrValue> {
    match spec.kind {
        AttributeKind::String => match raw {
            ApiValue::String(s) if spec.trim => Ok(AttrValue::string(s.trim())),
            ApiValue::String(s) => Ok(AttrValue::string(s.as_str())),
            ApiValue::Number(n) => Ok(AttrValue::string(n.to_string())),
            other => Err(mismatch(spec, shape_of(other))),
        },
        AttributeKind::Int64 => match raw {
            ApiValue::Number(n) => n.as_i64().map(AttrValue::int64).ok_or_else(|| {
                if n.is_f64() {
                    mismatch(spec, "float")
                } else {
                    mismatch(spec, "integer out of range")
                }
            }),
            other => Err(mismatch(spec, shape_of(other))),
        },
        AttributeKind::Bool => match raw {
            ApiValue::Bool(b) => Ok(AttrValue::boolean(*b)),
            other => Err(mismatch(spec, shape_of(other))),
        },
        AttributeKind::Float64 => match raw {
            ApiValue::Number(n) => n
                .as_f64()
                .map(AttrValue::float64)
                .ok_or_else(|| mismatch(spec, "number out of range")),
            other => Err(mismatch(spec, shape_of(other))),
        },
        AttributeKind::ListString => match raw {
            ApiValue::Array(items) => items
                .iter()
                .map(|item| {
                    scalar_text(item, false)
                        .ok_or_else(|| mismatch(spec, format!("array containing {}", shape_of(item))))
                })
                .collect::<Result<Vec<_>>>()
                .map(|items| AttrValue::List(TypedAttribute::Known(items))),
            other => Err(mismatch(spec, shape_of(other))),
        },
        AttributeKind::MapString => match raw {
            ApiValue::Object(entries) => entries
                .iter()
                .map(|(key, value)| {
                    scalar_text(value, true)
                        .map(|text| (key.clone(), text))
                        .ok_or_else(|| mismatch(spec, format!("object containing {}", shape_of(value))))
                })
                .collect::<Result<BTreeMap<_, _>>>()
                .map(|entries| AttrValue::Map(TypedAttribute::Known(entries))),
            other => Err(mismatch(spec, shape_of(other))),
        },
        AttributeKind::JsonText => Ok(AttrValue::string(canonical_json(raw))),
        AttributeKind::JsonYamlText => match raw {
            ApiValue::String(text) => canonicalize(text)
                .map(AttrValue::string)
                .map_err(|_| mismatch(spec, "string that is neither a JSON nor a YAML mapping")),
            other => Ok(AttrValue::string(canonical_json(other))),
        },
    }
}

fn scalar_text(value: &ApiValue, allow_bool: bool) -> Option<String> {
    match value {
        ApiValue::String(s) => Some(s.clone()),
        ApiValue::Number(n) => Some(n.to_string()),
        ApiValue::Bool(b) if allow_bool => Some(b.to_string()),
        _ => None,
    }
}

/// Compact JSON with object keys sorted at every level.
#[must_use]
pub fn canonical_json(value: &ApiValue) -> String {
    sorted(value).to_string()
}

fn sorted(value: &ApiValue) -> ApiValue {
    match value {
        ApiValue::Object(entries) => {
            let ordered: BTreeMap<&String, ApiValue> =
                entries.iter().map(|(k, v)| (k, sorted(v))).collect();
            ApiValue::Object(
                ordered
                    .into_iter()
                    .map(|(k, v)| (k.clone(), v))
                    .collect::<ApiObject>(),
            )
        }
        ApiValue::Array(items) => ApiValue::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

/// Normalize JSON or YAML mapping text to canonical JSON.
///
/// Blank text and a null document normalize to the empty string. Applying
/// this to its own output returns the output unchanged.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the text is neither JSON nor YAML, or does
/// not describe a mapping.
pub fn canonicalize(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Ok(String::new());
    }

    let value = match serde_json::from_str::<ApiValue>(text) {
        Ok(value) => value,
        Err(_) => serde_yaml::from_str::<ApiValue>(text)?,
    };

    match value {
        ApiValue::Null => Ok(String::new()),
        ApiValue::Object(_) => Ok(canonical_json(&value)),
        other => Err(Error::Decode(format!(
            "expected a mapping, found {}",
            shape_of(&other)
        ))),
    }
}

/// Encode one attribute for a write payload.
///
/// Returns `Ok(None)` when the field must be left out: read-only attributes,
/// and empty values of attributes marked omit-if-empty. Other empty values
/// are sent as JSON `null`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the value does not match the declared kind,
/// holds malformed JSON/YAML text, or is a non-finite float.
pub fn encode(spec: &AttributeSpec, value: &AttrValue) -> Result<Option<ApiValue>> {
    if !spec.is_sent() {
        return Ok(None);
    }
    if !spec.kind.accepts(value) {
        return Err(Error::Config(format!(
            "attribute `{}` expects {}, got {}",
            spec.name,
            spec.kind,
            value.type_name()
        )));
    }

    let empty = if spec.omit_if_empty {
        None
    } else {
        Some(ApiValue::Null)
    };

    let text = value.as_string().and_then(TypedAttribute::known);
    match spec.kind {
        AttributeKind::JsonText => match text {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(text)
                .map(Some)
                .map_err(|e| Error::Config(format!("attribute `{}` is not valid JSON: {e}", spec.name))),
            _ => Ok(empty),
        },
        AttributeKind::JsonYamlText => match text {
            Some(text) => {
                let canonical = canonicalize(text).map_err(|e| {
                    Error::Config(format!(
                        "attribute `{}` is not a JSON or YAML mapping: {e}",
                        spec.name
                    ))
                })?;
                if canonical.is_empty() {
                    Ok(empty)
                } else {
                    Ok(Some(ApiValue::String(canonical)))
                }
            }
            None => Ok(empty),
        },
        AttributeKind::Float64 => match value.as_float64().and_then(TypedAttribute::known) {
            Some(number) => serde_json::Number::from_f64(*number)
                .map(|n| Some(ApiValue::Number(n)))
                .ok_or_else(|| {
                    Error::Config(format!(
                        "attribute `{}` holds {number}, which has no JSON representation",
                        spec.name
                    ))
                }),
            None => Ok(empty),
        },
        _ => Ok(value.to_api_value().or(empty)),
    }
}

/// Decode every declared attribute of an object, in declaration order.
pub fn decode_object(
    schema: &ResourceSchema,
    object: &ApiObject,
    diagnostics: &mut Diagnostics,
) -> AttributeSet {
    schema
        .attributes
        .iter()
        .map(|spec| (spec.name, decode(spec, object.get(spec.name), diagnostics)))
        .collect()
}

/// Build a write payload from the attributes present in `state`.
///
/// # Errors
///
/// Returns the first encoding error.
pub fn encode_body(schema: &ResourceSchema, state: &AttributeSet) -> Result<ApiObject> {
    let mut body = ApiObject::new();
    for spec in schema.attributes.iter().filter(|spec| spec.is_sent()) {
        let Some(value) = state.get(spec.name) else {
            continue;
        };
        if let Some(encoded) = encode(spec, value)? {
            body.insert(spec.name.to_string(), encoded);
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL_KINDS: [AttributeKind; 8] = [
        AttributeKind::String,
        AttributeKind::Int64,
        AttributeKind::Bool,
        AttributeKind::Float64,
        AttributeKind::ListString,
        AttributeKind::MapString,
        AttributeKind::JsonText,
        AttributeKind::JsonYamlText,
    ];

    fn spec(kind: AttributeKind) -> AttributeSpec {
        AttributeSpec::new("field", kind)
    }

    fn decode_one(spec: &AttributeSpec, raw: &ApiValue) -> (AttrValue, Diagnostics) {
        let mut diags = Diagnostics::new();
        let value = decode(spec, Some(raw), &mut diags);
        (value, diags)
    }

    #[test]
    fn null_and_absent_decode_to_null() {
        for kind in ALL_KINDS {
            let mut diags = Diagnostics::new();
            assert!(decode(&spec(kind), None, &mut diags).is_null(), "{kind} absent");
            assert!(decode(&spec(kind), Some(&json!(null)), &mut diags).is_null(), "{kind} null");
            assert!(diags.is_empty());
        }
    }

    #[test]
    fn strings_accept_numbers() {
        let (value, diags) = decode_one(&spec(AttributeKind::String), &json!(12));
        assert_eq!(value, AttrValue::string("12"));
        assert!(diags.is_empty());
    }

    #[test]
    fn strings_trim_when_asked() {
        let (value, _) = decode_one(&spec(AttributeKind::String).trimmed(), &json!("  ops \n"));
        assert_eq!(value, AttrValue::string("ops"));
        let (value, _) = decode_one(&spec(AttributeKind::String), &json!("  ops \n"));
        assert_eq!(value, AttrValue::string("  ops \n"));
    }

    #[test]
    fn int64_rejects_floats_and_strings() {
        let (value, diags) = decode_one(&spec(AttributeKind::Int64), &json!(1.5));
        assert!(value.is_null());
        assert_eq!(diags.error_count(), 1);
        assert!(diags.iter().next().unwrap().detail.contains("found float"));

        let (value, diags) = decode_one(&spec(AttributeKind::Int64), &json!("7"));
        assert!(value.is_null());
        assert_eq!(diags.iter().next().unwrap().attribute.as_deref(), Some("field"));
    }

    #[test]
    fn float64_accepts_integers() {
        let (value, diags) = decode_one(&spec(AttributeKind::Float64), &json!(3));
        assert_eq!(value, AttrValue::float64(3.0));
        assert!(diags.is_empty());
    }

    #[test]
    fn lists_and_maps() {
        let (value, _) = decode_one(&spec(AttributeKind::ListString), &json!(["a", 1]));
        assert_eq!(value, AttrValue::list(["a", "1"]));

        let (value, diags) = decode_one(&spec(AttributeKind::ListString), &json!(["a", {}]));
        assert!(value.is_null());
        assert!(diags.iter().next().unwrap().detail.contains("array containing object"));

        let (value, _) = decode_one(&spec(AttributeKind::MapString), &json!({"a": "x", "b": 2, "c": true}));
        assert_eq!(value, AttrValue::map([("a", "x"), ("b", "2"), ("c", "true")]));
    }

    #[test]
    fn json_text_is_canonical() {
        let (value, _) = decode_one(
            &spec(AttributeKind::JsonText),
            &json!({"username": "svc", "password": "$encrypted$", "nested": {"z": 1, "a": [2, 1]}}),
        );
        assert_eq!(
            value,
            AttrValue::string(r#"{"nested":{"a":[2,1],"z":1},"password":"$encrypted$","username":"svc"}"#)
        );
    }

    #[test]
    fn json_yaml_text_from_yaml_string() {
        let (value, diags) = decode_one(
            &spec(AttributeKind::JsonYamlText),
            &json!("---\nhttp_port: 8080\nservers:\n  - web1\n"),
        );
        assert!(diags.is_empty());
        assert_eq!(value, AttrValue::string(r#"{"http_port":8080,"servers":["web1"]}"#));
    }

    #[test]
    fn json_yaml_text_empty_document() {
        for raw in [json!(""), json!("   "), json!("---\n"), json!("null")] {
            let (value, diags) = decode_one(&spec(AttributeKind::JsonYamlText), &raw);
            assert_eq!(value, AttrValue::string(""), "{raw}");
            assert!(diags.is_empty());
        }
    }

    #[test]
    fn json_yaml_text_rejects_scalars() {
        let (value, diags) = decode_one(&spec(AttributeKind::JsonYamlText), &json!("just text"));
        assert!(value.is_null());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for text in [
            "{\"b\": 1, \"a\": {\"d\": [1, 2], \"c\": null}}",
            "b: 1\na:\n  d: [1, 2]\n  c: ~\n",
            "{}",
            "",
        ] {
            let once = canonicalize(text).unwrap();
            assert_eq!(canonicalize(&once).unwrap(), once, "{text}");
        }
    }

    #[test]
    fn yaml_and_json_agree() {
        let from_json = canonicalize("{\"a\": 1, \"b\": [\"x\"]}").unwrap();
        let from_yaml = canonicalize("a: 1\nb:\n  - x\n").unwrap();
        assert_eq!(from_json, from_yaml);
    }

    #[test]
    fn sensitive_attributes_never_take_server_values() {
        let spec = AttributeSpec::new("password", AttributeKind::String).sensitive();
        for raw in [json!("hunter2"), json!("$encrypted$"), json!(5), json!({"a": 1})] {
            let (value, diags) = decode_one(&spec, &raw);
            assert_eq!(value, AttrValue::string(""));
            assert!(diags.is_empty());
        }
        let mut diags = Diagnostics::new();
        assert!(decode(&spec, None, &mut diags).is_null());
    }

    #[test]
    fn encode_empty_values() {
        let value = AttrValue::Int64(TypedAttribute::Null);
        assert_eq!(encode(&spec(AttributeKind::Int64), &value).unwrap(), Some(json!(null)));
        assert_eq!(encode(&spec(AttributeKind::Int64).omit_if_empty(), &value).unwrap(), None);

        let unknown = AttrValue::String(TypedAttribute::Unknown);
        assert_eq!(encode(&spec(AttributeKind::String).omit_if_empty(), &unknown).unwrap(), None);
    }

    #[test]
    fn encode_skips_read_only() {
        let spec = AttributeSpec::new("id", AttributeKind::Int64).read_only();
        assert_eq!(encode(&spec, &AttrValue::int64(1)).unwrap(), None);
    }

    #[test]
    fn encode_rejects_kind_mismatch() {
        let err = encode(&spec(AttributeKind::Int64), &AttrValue::string("1")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn encode_non_finite_float() {
        let ratio = spec(AttributeKind::Float64);
        assert_eq!(encode(&ratio, &AttrValue::float64(0.5)).unwrap(), Some(json!(0.5)));

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode(&ratio, &AttrValue::float64(value)).unwrap_err();
            assert!(matches!(err, Error::Config(ref message) if message.contains(ratio.name)));
        }
    }

    #[test]
    fn encode_structured_text() {
        let inputs = AttrValue::string(r#"{"username":"svc"}"#);
        assert_eq!(
            encode(&spec(AttributeKind::JsonText), &inputs).unwrap(),
            Some(json!({"username": "svc"}))
        );

        let variables = AttrValue::string("b: 2\na: 1\n");
        assert_eq!(
            encode(&spec(AttributeKind::JsonYamlText), &variables).unwrap(),
            Some(json!(r#"{"a":1,"b":2}"#))
        );

        let err = encode(&spec(AttributeKind::JsonText), &AttrValue::string("{oops")).unwrap_err();
        assert!(matches!(err, Error::Config(ref message) if message.contains("`field`")));
        let err = encode(&spec(AttributeKind::JsonYamlText), &AttrValue::string("[1, 2]")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn round_trip_for_writable_kinds() {
        let cases = [
            (AttributeKind::String, AttrValue::string("ops")),
            (AttributeKind::Int64, AttrValue::int64(-42)),
            (AttributeKind::Bool, AttrValue::boolean(true)),
            (AttributeKind::Float64, AttrValue::float64(2.5)),
            (AttributeKind::ListString, AttrValue::list(["a", "b"])),
            (AttributeKind::MapString, AttrValue::map([("k", "v")])),
            (AttributeKind::JsonText, AttrValue::string(r#"{"a":[1,{"b":null}]}"#)),
            (AttributeKind::JsonYamlText, AttrValue::string(r#"{"a":1}"#)),
        ];
        for (kind, value) in cases {
            let spec = spec(kind);
            let wire = encode(&spec, &value).unwrap().unwrap();
            let (back, diags) = decode_one(&spec, &wire);
            assert!(diags.is_empty(), "{kind}");
            assert_eq!(back, value, "{kind}");
        }
    }

    #[test]
    fn structured_text_decode_encode_is_stable() {
        let spec = spec(AttributeKind::JsonYamlText);
        let raw = json!("z: 1\na:\n  - x\n");
        let (first, _) = decode_one(&spec, &raw);
        let (second, _) = decode_one(&spec, &encode(&spec, &first).unwrap().unwrap());
        let (third, _) = decode_one(&spec, &encode(&spec, &second).unwrap().unwrap());
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn three_malformed_of_ten() {
        let mut schema = ResourceSchema::new("Thing", "/api/v2/things/");
        for (name, kind) in [
            ("a", AttributeKind::String),
            ("b", AttributeKind::Int64),
            ("c", AttributeKind::Bool),
            ("d", AttributeKind::Float64),
            ("e", AttributeKind::ListString),
            ("f", AttributeKind::MapString),
            ("g", AttributeKind::JsonText),
            ("h", AttributeKind::JsonYamlText),
            ("i", AttributeKind::Int64),
            ("j", AttributeKind::Bool),
        ] {
            schema = schema.attribute(AttributeSpec::new(name, kind));
        }
        let object = match json!({
            "a": "x", "b": "not a number", "c": true, "d": 1.5, "e": {"oops": 1},
            "f": {"k": "v"}, "g": [1], "h": "k: v", "i": 3, "j": "yes"
        }) {
            ApiValue::Object(object) => object,
            _ => unreachable!(),
        };

        let mut diags = Diagnostics::new();
        let state = decode_object(&schema, &object, &mut diags);

        assert_eq!(diags.error_count(), 3);
        let failed: Vec<_> = diags.iter().filter_map(|d| d.attribute.as_deref()).collect();
        assert_eq!(failed, vec!["b", "e", "j"]);
        assert_eq!(state.iter().filter(|(_, v)| v.is_known()).count(), 7);
        assert!(state.get("b").unwrap().is_null());
    }

    #[test]
    fn encode_body_uses_present_sent_attributes() {
        let schema = ResourceSchema::new("Team", "/api/v2/teams/")
            .attribute(AttributeSpec::new("id", AttributeKind::Int64).read_only())
            .attribute(AttributeSpec::new("name", AttributeKind::String))
            .attribute(AttributeSpec::new("description", AttributeKind::String).omit_if_empty())
            .attribute(AttributeSpec::new("organization", AttributeKind::Int64));
        let state = AttributeSet::new()
            .with("id", AttrValue::int64(3))
            .with("name", AttrValue::string("ops"))
            .with("description", AttrValue::String(TypedAttribute::Null));

        let body = encode_body(&schema, &state).unwrap();
        assert_eq!(ApiValue::Object(body), json!({"name": "ops"}));
    }
}
