//! Request shaping and response decoding for data-plane calls.

use serde_json::Value;

use crate::error::Error;

/// How one logical operation reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    /// `GET /redis/{id}/{op}/{segments...}` with extra query pairs.
    Path {
        op: &'static str,
        segments: Vec<String>,
        query: Vec<(&'static str, String)>,
    },
    /// `POST /redis/{id}` with the arguments as a JSON array.
    Command(Vec<String>),
}

impl Route {
    /// Picks the path form when every argument fits in a path segment.
    ///
    /// `command` is the equivalent argument vector for the body form.
    pub(crate) fn choose(
        op: &'static str,
        segments: Vec<String>,
        query: Vec<(&'static str, String)>,
        command: Vec<String>,
        inline_limit: usize,
    ) -> Self {
        if segments.iter().all(|s| fits_inline(s, inline_limit)) {
            Route::Path {
                op,
                segments,
                query,
            }
        } else {
            Route::Command(command)
        }
    }

    /// Name of the operation, for logging.
    pub(crate) fn op_name(&self) -> &str {
        match self {
            Route::Path { op, .. } => op,
            Route::Command(args) => args.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// `.` and `..` would be collapsed as dot segments by URL parsing, even when
/// percent-encoded.
fn fits_inline(segment: &str, limit: usize) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && segment.len() <= limit
}

/// Extracts `result` from a `{"result": ...}` body.
///
/// A body without `result` (or an empty body) yields `Null`.
pub(crate) fn parse_result(body: &str) -> Result<Value, Error> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    let value: Value = serde_json::from_str(body)?;
    match value {
        Value::Object(mut map) => Ok(map.remove("result").unwrap_or(Value::Null)),
        other => Ok(other),
    }
}

/// Expects a status string such as `"OK"` or `"PONG"`.
pub(crate) fn expect_text(value: Value, op: &str) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s),
        Value::Bool(true) => Ok("OK".to_string()),
        other => Err(Error::invalid_response(format!(
            "{} returned {} instead of a status string",
            op, other
        ))),
    }
}

/// Decodes a `GET` result: `null` is a missing key.
pub(crate) fn expect_optional_text(value: Value) -> Result<Option<String>, Error> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(Error::invalid_response(format!(
            "GET returned {} instead of a string or null",
            other
        ))),
    }
}

/// Decodes an integer reply such as the `DEL` count.
pub(crate) fn expect_count(value: Value, op: &str) -> Result<u64, Error> {
    match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        Error::invalid_response(format!("{} returned {} instead of a count", op, value))
    })
}
