//! Response envelope normalization.
//!
//! The gateway wraps most management responses as
//! `{"success": bool, "data": T | null, "message": string | null}` but some
//! endpoint families (and some gateway versions) answer with the bare object.
//! Every 2xx body is classified once into an [`Envelope`] and then reduced to
//! its payload by [`Envelope::normalize`].

use serde_json::Value;

use crate::config::ApiContract;
use crate::error::{Error, ErrorKind};

/// A classified 2xx response body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Envelope {
    /// `{success, data, error|message}`.
    Enveloped {
        success: bool,
        data: Option<Value>,
        error: Option<String>,
    },
    /// Any other JSON body. The body itself is the payload.
    Raw(Value),
}

impl Envelope {
    /// Classifies a JSON body.
    ///
    /// An object is an envelope when it carries a boolean `success` field or
    /// a `data` field.
    pub(crate) fn classify(body: Value) -> Self {
        match body {
            Value::Object(mut map)
                if map.get("success").is_some_and(Value::is_boolean)
                    || map.contains_key("data") =>
            {
                let success = map.get("success").and_then(Value::as_bool).unwrap_or(true);
                let data = map.remove("data").filter(|d| !d.is_null());
                let error = error_text_from_map(&map);

                Envelope::Enveloped {
                    success,
                    data,
                    error,
                }
            }
            other => Envelope::Raw(other),
        }
    }

    /// Parses and classifies a raw response body.
    ///
    /// An empty body classifies as `Raw(Null)`.
    pub(crate) fn parse(body: &str) -> Result<Self, Error> {
        if body.trim().is_empty() {
            return Ok(Envelope::Raw(Value::Null));
        }
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::classify(value))
    }

    /// Reduces the envelope to its payload.
    ///
    /// `failure_kind` is the kind reported when a 2xx body says
    /// `success: false`. An enveloped success without data yields `Null`.
    pub(crate) fn normalize(
        self,
        contract: &ApiContract,
        failure_kind: ErrorKind,
    ) -> Result<Value, Error> {
        match self {
            Envelope::Enveloped {
                success: true,
                data,
                ..
            } => Ok(data.unwrap_or(Value::Null)),
            Envelope::Enveloped {
                success: false,
                error,
                ..
            } => Err(Error::new(
                failure_kind,
                error.unwrap_or_else(|| "request was not successful".to_string()),
            )),
            Envelope::Raw(value) if contract.accepts_raw() => Ok(value),
            Envelope::Raw(_) => Err(Error::invalid_response(
                "response is not wrapped in a {success, data} envelope",
            )),
        }
    }
}

/// Extracts the human-readable failure text from an error body.
///
/// Looks at `error` first, then `message`. Falls back to the trimmed raw body
/// when it is not JSON or carries neither field.
pub(crate) fn error_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.as_object().and_then(error_text_from_map))
        .unwrap_or_else(|| body.trim().to_string())
}

fn error_text_from_map(map: &serde_json::Map<String, Value>) -> Option<String> {
    ["error", "message"]
        .iter()
        .filter_map(|field| map.get(*field))
        .find_map(|value| match value {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Object(inner) => inner.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
}
