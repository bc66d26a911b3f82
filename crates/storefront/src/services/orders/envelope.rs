//! Decoding of the order service's `{success, message, ...}` envelope.
//!
//! Every endpoint answers with a JSON object carrying a `success` flag. The
//! flag is turned into a [`BackendResult`] once, here, so call sites match on
//! an enum instead of poking at booleans.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of an order service call that reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendResult<T> {
    /// `success: true`, with the decoded payload.
    Ok(T),
    /// `success: false`, with the service's message if it sent one.
    Rejected(Option<String>),
}

impl<T> BackendResult<T> {
    /// Map the success payload.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> BackendResult<U> {
        match self {
            Self::Ok(value) => BackendResult::Ok(f(value)),
            Self::Rejected(message) => BackendResult::Rejected(message),
        }
    }
}

/// Errors decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// Body is not JSON, or the payload does not match the expected shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Body is JSON but has no boolean `success` field.
    #[error("response has no success flag")]
    MissingSuccessFlag,
}

/// Decode a response body into a [`BackendResult`].
///
/// The payload type is decoded from the whole object, so payload structs can
/// name any top-level field (including `message`).
///
/// # Errors
///
/// Returns an error if the body is not a JSON object with a boolean `success`
/// field, or if a successful payload does not decode as `T`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<BackendResult<T>, EnvelopeError> {
    let value: Value = serde_json::from_str(body)?;

    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(BackendResult::Ok(serde_json::from_value(value)?)),
        Some(false) => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from);
            Ok(BackendResult::Rejected(message))
        }
        None => Err(EnvelopeError::MissingSuccessFlag),
    }
}
