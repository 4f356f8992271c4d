//! Search-envelope unwrapping.
//!
//! AWX answers list and filter requests with a paginated envelope
//! (`count`, `next`, `previous`, `results`). A lookup expects exactly one
//! object, so the envelope is collapsed here before attribute decoding.

use crate::error::{Error, Result};
use crate::value::{shape_of, ApiObject, ApiValue};

const COUNT_KEY: &str = "count";
const RESULTS_KEY: &str = "results";

/// Returns true if the object looks like a search envelope.
#[must_use]
pub fn is_search_envelope(object: &ApiObject) -> bool {
    object.contains_key(COUNT_KEY) && object.contains_key(RESULTS_KEY)
}

/// Normalize a decoded response into a single object.
///
/// Objects that are not search envelopes are returned unchanged.
///
/// # Errors
///
/// - [`Error::NotFound`] when the envelope reports zero results
/// - [`Error::AmbiguousMatch`] when it reports more than one
/// - [`Error::Decode`] when `count` is not a non-negative integer (or its
///   decimal text), `results` is not a list, or the single result is missing
///   or not an object
pub fn unwrap(mut object: ApiObject) -> Result<ApiObject> {
    if !is_search_envelope(&object) {
        return Ok(object);
    }

    let count = parse_count(object.get(COUNT_KEY))?;
    let results = match object.remove(RESULTS_KEY) {
        Some(ApiValue::Array(results)) => results,
        Some(other) => {
            return Err(Error::Decode(format!(
                "search result `results` is {}, expected array",
                shape_of(&other)
            )))
        }
        None => Vec::new(),
    };

    match count {
        0 => Err(Error::NotFound(
            "the search returned no matching resource".to_string(),
        )),
        1 => match results.into_iter().next() {
            Some(ApiValue::Object(single)) => Ok(single),
            Some(other) => Err(Error::Decode(format!(
                "search result entry is {}, expected object",
                shape_of(&other)
            ))),
            None => Err(Error::Decode(
                "search result reported one entry but `results` is empty".to_string(),
            )),
        },
        count => Err(Error::AmbiguousMatch { count }),
    }
}

fn parse_count(value: Option<&ApiValue>) -> Result<u64> {
    match value {
        Some(ApiValue::Number(n)) => n.as_u64().ok_or_else(|| {
            Error::Decode(format!("search result count `{n}` is not a non-negative integer"))
        }),
        Some(ApiValue::String(s)) => s.trim().parse::<u64>().map_err(|e| {
            Error::Decode(format!("failed to convert search result count `{s}`: {e}"))
        }),
        Some(other) => Err(Error::Decode(format!(
            "search result count is {}, expected number",
            shape_of(other)
        ))),
        None => Err(Error::Decode("search result has no count".to_string())),
    }
}
