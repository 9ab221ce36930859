//! Assertion helpers for list responses.
//!
//! `assert_shape` compares JSON loosely: objects must contain at least the
//! expected keys, arrays must match exactly in length, floats within 1e-6.
//! Expected shapes are [`Expected`] trees, so matchers such as
//! [`instance_of`], [`matching`] or [`UNDEFINED`] can sit at any depth:
//!
//! ```rust
//! use resty_query::testing::{assert_shape, instance_of, Expected, JsonKind, UNDEFINED};
//! use serde_json::json;
//!
//! let body = json!({"id": 7, "color": "red"});
//! assert_shape(
//!     &body,
//!     Expected::object([
//!         ("id", instance_of(JsonKind::Number).into()),
//!         ("color", json!("red").into()),
//!         ("deleted_at", UNDEFINED),
//!     ]),
//! );
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value as Json;

/// Expected shape of a JSON value.
#[derive(Clone, Debug)]
pub enum Expected {
    /// Compared by equality; numbers with a float on either side within 1e-6.
    Literal(Json),
    /// Superset match: every listed key must match, extra keys are ignored.
    Object(Vec<(String, Expected)>),
    /// Exact length, element-wise match.
    Array(Vec<Expected>),
    /// Inside an object: the key must be absent.
    Undefined,
    Matcher(Matcher),
}

/// The key must not be present.
pub const UNDEFINED: Expected = Expected::Undefined;

impl Expected {
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Expected)>,
    {
        Expected::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array<I: IntoIterator<Item = Expected>>(items: I) -> Self {
        Expected::Array(items.into_iter().collect())
    }
}

impl From<Json> for Expected {
    fn from(value: Json) -> Self {
        match value {
            Json::Object(map) => Expected::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Expected::from(v)))
                    .collect(),
            ),
            Json::Array(items) => Expected::Array(items.into_iter().map(Expected::from).collect()),
            other => Expected::Literal(other),
        }
    }
}

impl From<&Json> for Expected {
    fn from(value: &Json) -> Self {
        Expected::from(value.clone())
    }
}

impl From<Matcher> for Expected {
    fn from(m: Matcher) -> Self {
        Expected::Matcher(m)
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Literal(v) => write!(f, "{v}"),
            Expected::Object(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "\"{k}\":{v}")?;
                }
                f.write_str("}")
            }
            Expected::Array(items) => {
                f.write_str("[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Expected::Undefined => f.write_str("UNDEFINED"),
            Expected::Matcher(m) => write!(f, "{m:?}"),
        }
    }
}

/// Check that `actual` has the shape of `expected`, returning the JSON path of
/// the first mismatch.
pub fn shape_mismatch(actual: &Json, expected: impl Into<Expected>) -> Option<String> {
    mismatch_at(actual, &expected.into(), "$")
}

fn mismatch_at(actual: &Json, expected: &Expected, path: &str) -> Option<String> {
    match (expected, actual) {
        (Expected::Object(entries), Json::Object(act)) => {
            entries.iter().find_map(|(key, value)| {
                let at = format!("{path}.{key}");
                match (value, act.get(key)) {
                    (Expected::Undefined, None) => None,
                    (Expected::Undefined, Some(_)) => Some(format!("{at} (expected absent)")),
                    (_, Some(a)) => mismatch_at(a, value, &at),
                    (_, None) => Some(at),
                }
            })
        }
        (Expected::Array(items), Json::Array(act)) => {
            if items.len() != act.len() {
                return Some(format!("{path} (length {} != {})", act.len(), items.len()));
            }
            items
                .iter()
                .zip(act)
                .enumerate()
                .find_map(|(i, (e, a))| mismatch_at(a, e, &format!("{path}[{i}]")))
        }
        (Expected::Matcher(m), _) => (!m.matches(actual)).then(|| format!("{path} ({m:?})")),
        (Expected::Literal(Json::Number(exp)), Json::Number(act))
            if exp.is_f64() || act.is_f64() =>
        {
            match (exp.as_f64(), act.as_f64()) {
                (Some(e), Some(a)) if (e - a).abs() < 1e-6 => None,
                _ => Some(path.to_string()),
            }
        }
        (Expected::Literal(exp), _) if exp == actual => None,
        _ => Some(path.to_string()),
    }
}

/// Panic with the mismatching path when `actual` does not have the shape of
/// `expected`.
#[track_caller]
pub fn assert_shape(actual: &Json, expected: impl Into<Expected>) {
    let expected = expected.into();
    if let Some(path) = mismatch_at(actual, &expected, "$") {
        panic!("shape mismatch at {path}\n  actual:   {actual}\n  expected: {expected}");
    }
}

/// Check a list or error response: the status first, then `data` for 2xx
/// bodies or `errors` otherwise. `UNDEFINED` skips the body check.
#[track_caller]
pub fn assert_response(
    status: u16,
    body: &Json,
    expected_status: u16,
    expected: impl Into<Expected>,
) {
    assert_eq!(status, expected_status, "unexpected status, body: {body}");

    let expected = expected.into();
    if matches!(expected, Expected::Undefined) {
        return;
    }
    let member = if (200..300).contains(&status) {
        "data"
    } else {
        "errors"
    };
    let Some(contents) = body.get(member) else {
        panic!("response has no '{member}' member: {body}");
    };
    if let Some(path) = mismatch_at(contents, &expected, &format!("$.{member}")) {
        panic!("shape mismatch at {path}\n  actual:   {contents}\n  expected: {expected}");
    }
}

/// Reusable JSON predicate for assertions that need more than equality.
#[derive(Clone)]
pub struct Matcher {
    name: String,
    check: Arc<dyn Fn(&Json) -> bool + Send + Sync>,
}

impl Matcher {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Json) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn matches(&self, value: &Json) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Matches values that have the shape of `expected`.
pub fn shape(expected: impl Into<Expected>) -> Matcher {
    let expected = expected.into();
    Matcher::new(format!("shape({expected})"), move |actual| {
        mismatch_at(actual, &expected, "$").is_none()
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

/// Matches values of one JSON kind.
pub fn instance_of(kind: JsonKind) -> Matcher {
    Matcher::new(format!("instance_of({kind:?})"), move |actual| {
        let found = match actual {
            Json::Null => JsonKind::Null,
            Json::Bool(_) => JsonKind::Bool,
            Json::Number(_) => JsonKind::Number,
            Json::String(_) => JsonKind::String,
            Json::Array(_) => JsonKind::Array,
            Json::Object(_) => JsonKind::Object,
        };
        found == kind
    })
}

/// Matches strings that start with a match of `pattern`.
pub fn matching(pattern: &str) -> Result<Matcher, regex::Error> {
    let re = Regex::new(&format!("^(?:{pattern})"))?;
    Ok(Matcher::new(format!("matching({pattern:?})"), move |actual| {
        actual.as_str().is_some_and(|s| re.is_match(s))
    }))
}
