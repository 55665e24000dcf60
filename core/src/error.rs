//! Error types for the stack service client.
//!
//! # Design
//! Every non-200 response lands in `ResponseError` with the status, reason
//! phrase and raw body exactly as received. There is no 4xx/5xx split and no
//! retry classification. The provider's error code can be read out of the
//! body on demand via `error_code()`.

use serde_json::Value;

/// Errors returned by `StackServiceClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Caller input could not be encoded into request parameters.
    #[error("invalid value for {field}: {message}")]
    EncodingError { field: &'static str, message: String },

    /// The service answered with a status other than 200.
    #[error("HTTP {status} {reason}: {body}")]
    ResponseError {
        status: u16,
        reason: String,
        body: String,
    },

    /// A 200 response body could not be decoded.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The transport failed before any response was received.
    #[error("transport failed: {0}")]
    TransportError(String),
}

impl ApiError {
    pub(crate) fn encoding(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::EncodingError {
            field,
            message: message.into(),
        }
    }

    /// HTTP status of a `ResponseError`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ResponseError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider error code (e.g. `ValidationError`) carried in a
    /// `ResponseError` body, in either the XML or JSON error shape.
    pub fn error_code(&self) -> Option<String> {
        self.error_field("Code")
    }

    /// Provider error message carried in a `ResponseError` body.
    pub fn error_message(&self) -> Option<String> {
        self.error_field("Message")
    }

    fn error_field(&self, name: &str) -> Option<String> {
        let ApiError::ResponseError { body, .. } = self else {
            return None;
        };
        let body = body.trim_start();
        if body.starts_with('<') {
            let doc = roxmltree::Document::parse(body).ok()?;
            let error = doc.descendants().find(|n| n.has_tag_name("Error"))?;
            let field = error.children().find(|n| n.has_tag_name(name))?;
            return field.text().map(|t| t.trim().to_string());
        }
        let value: Value = serde_json::from_str(body).ok()?;
        let error = value
            .get("Error")
            .or_else(|| value.get("ErrorResponse").and_then(|r| r.get("Error")))?;
        error.get(name)?.as_str().map(str::to_string)
    }
}
