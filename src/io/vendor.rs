//! Shared plumbing for third-party HTTP APIs
//!
//! Every vendor response is read once into a [`VendorReply`], and error
//! messages are pulled out of the body with [`vendor_message`] so that
//! callers see one error shape regardless of vendor.

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum VendorError {
    /// Vendor answered with a non-success status
    #[error("{message}")]
    Http { status: u16, message: String },
    /// Connection, TLS, or timeout failure before a response arrived
    #[error("{0}")]
    Transport(String),
    /// Response body was not the JSON we expected
    #[error("{0}")]
    Decode(String),
    #[error("invalid vendor url: {0}")]
    InvalidUrl(String),
}

impl VendorError {
    pub fn status(&self) -> Option<u16> {
        match self {
            VendorError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for VendorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            VendorError::Decode(e.to_string())
        } else {
            VendorError::Transport(e.to_string())
        }
    }
}

/// Best-effort error text: `message`, else `error` (string or `{message}`), else `fallback`
pub fn vendor_message(body: Option<&Value>, fallback: &str) -> String {
    fn non_empty(value: Option<&Value>) -> Option<&str> {
        value.and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    let Some(body) = body else {
        return fallback.to_string();
    };

    non_empty(body.get("message"))
        .or_else(|| non_empty(body.get("error")))
        .or_else(|| non_empty(body.get("error").and_then(|e| e.get("message"))))
        .unwrap_or(fallback)
        .to_string()
}

/// A vendor response with the body parsed as JSON when present
#[derive(Debug)]
pub struct VendorReply {
    pub status: StatusCode,
    /// `None` for an empty body
    pub body: Option<Value>,
}

impl VendorReply {
    /// Read the full response. A malformed body on a success status is a
    /// decode error; on an error status it is tolerated (the status wins).
    pub async fn read(response: reqwest::Response) -> Result<Self, VendorError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) if status.is_success() => {
                    return Err(VendorError::Decode(format!("invalid JSON from vendor: {e}")));
                }
                Err(_) => None,
            }
        };

        Ok(Self { status, body })
    }

    /// Turn a non-success status into [`VendorError::Http`]
    pub fn error_for_status(self, fallback: &str) -> Result<Self, VendorError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(VendorError::Http {
                status: self.status.as_u16(),
                message: vendor_message(self.body.as_ref(), fallback),
            })
        }
    }
}

/// The shapes a proximity endpoint may answer with
#[derive(Debug, Clone, PartialEq)]
pub enum VendorPayload {
    List(Vec<Value>),
    Single(Value),
    Empty,
}

/// An id is usable when it is a non-empty string or a non-zero number.
/// `null`, `""`, `0` and booleans all mean "no item".
fn has_usable_id(value: &Value) -> bool {
    match value.get("id") {
        Some(Value::String(id)) => !id.is_empty(),
        Some(Value::Number(id)) => id.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

impl VendorPayload {
    /// Classify a body once, right after the network call. An object only
    /// counts as an item if it carries a usable `id`.
    pub fn classify(body: Option<Value>) -> Self {
        match body {
            Some(Value::Array(items)) => VendorPayload::List(items),
            Some(value @ Value::Object(_)) if has_usable_id(&value) => {
                VendorPayload::Single(value)
            }
            _ => VendorPayload::Empty,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            VendorPayload::List(_) => "list",
            VendorPayload::Single(_) => "single",
            VendorPayload::Empty => "empty",
        }
    }

    /// Decode every entry. An entry without a usable id, or one that does not
    /// decode, is dropped on its own; the rest of the result is kept.
    pub fn into_items<T: DeserializeOwned>(self) -> Vec<T> {
        let values = match self {
            VendorPayload::List(values) => values,
            VendorPayload::Single(value) => vec![value],
            VendorPayload::Empty => return Vec::new(),
        };

        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                if !has_usable_id(&value) {
                    warn!(index, "vendor_item_without_id_dropped");
                    return None;
                }
                serde_json::from_value(value)
                    .map_err(|e| warn!(index, error = %e, "vendor_item_dropped"))
                    .ok()
            })
            .collect()
    }
}

/// Detail endpoints sometimes wrap the record as `{success: true, data: {...}}`
pub fn unwrap_envelope(body: Value) -> Value {
    let wrapped = body.get("success").and_then(Value::as_bool).unwrap_or(false)
        && body.get("data").is_some_and(|data| !data.is_null());

    match body {
        Value::Object(mut map) if wrapped => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Append path segments to a base URL, percent-encoding each one
pub fn join_segments(base: &str, segments: &[&str]) -> Result<Url, VendorError> {
    let mut url = Url::parse(base).map_err(|e| VendorError::InvalidUrl(format!("{base}: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| VendorError::InvalidUrl(format!("{base}: cannot be a base")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
