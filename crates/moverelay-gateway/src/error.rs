//! Error types for the request gateway.
//!
//! [`RelayError`] is the full failure taxonomy a caller can observe. A
//! failure is rendered together with a [`RequestEcho`] of the offending
//! request through the [`Rejection`] wrapper, whose
//! [`IntoResponse`](axum::response::IntoResponse) implementation produces
//! the JSON error envelope.

use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use moverelay_store::StoreError;
use serde_json::{Map, Value};

use crate::dispatch::Action;

/// Errors that can occur while handling a relay request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The request used a method other than `POST`.
    #[error("Expected 'POST', got '{0}'.")]
    BadMethod(String),

    /// The request did not declare a JSON body.
    #[error("Expected 'application/json', got '{}'.", .0.as_deref().unwrap_or("none"))]
    BadContentType(Option<String>),

    /// The body could not be read or is not valid JSON.
    #[error("Request body could not be decoded as JSON: {0}")]
    DecodeFailure(String),

    /// The `action` field is absent or names no known action.
    #[error("Unknown action: '{}'.", action_label(.0))]
    UnknownAction(Value),

    /// A field the action requires is absent or not a string.
    #[error("Missing required field '{field}' for action '{action}'.")]
    MissingField {
        /// The action being dispatched.
        action: Action,
        /// Name of the missing field.
        field: &'static str,
    },

    /// No move log exists for the username.
    #[error("No move log found for '{username}'.")]
    LogNotFound {
        /// The username that was looked up.
        username: String,
    },

    /// The move log exists but has no move under the key.
    #[error("No move with key '{key}' found for '{username}'.")]
    KeyNotFound {
        /// The ledger owner.
        username: String,
        /// The missing turn key.
        key: String,
    },

    /// Storage or runtime failure. Carries the raw detail for diagnosis.
    #[error("Server error encountered when processing POST request.")]
    Internal(String),
}

impl RelayError {
    /// HTTP status the error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::LogNotFound { .. } | Self::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadMethod(_)
            | Self::BadContentType(_)
            | Self::DecodeFailure(_)
            | Self::UnknownAction(_)
            | Self::MissingField { .. }
            | Self::Internal(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable name of the error kind, reported as `kind` in responses.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadMethod(_) => "BadMethod",
            Self::BadContentType(_) => "BadContentType",
            Self::DecodeFailure(_) => "DecodeFailure",
            Self::UnknownAction(_) => "UnknownAction",
            Self::MissingField { .. } => "MissingField",
            Self::LogNotFound { .. } => "LogNotFound",
            Self::KeyNotFound { .. } => "KeyNotFound",
            Self::Internal(_) => "InternalFailure",
        }
    }
}

impl From<StoreError> for RelayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LogNotFound { username } => Self::LogNotFound { username },
            StoreError::KeyNotFound { username, key } => Self::KeyNotFound { username, key },
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Render an offending `action` value for messages: strings verbatim,
/// anything else as JSON.
fn action_label(action: &Value) -> String {
    match action {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// What a failed request looked like, echoed back for diagnosis.
#[derive(Debug, Clone)]
pub struct RequestEcho {
    method: String,
    uri: String,
    headers: Map<String, Value>,
    /// The decoded body, or the raw body text if decoding failed. `None`
    /// when the request was rejected before its body was read.
    pub body: Option<Value>,
}

impl RequestEcho {
    /// Capture the request line and headers.
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let mut echoed = Map::new();
        for name in headers.keys() {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            echoed.insert(name.as_str().to_owned(), Value::String(joined));
        }
        Self {
            method: method.to_string(),
            uri: uri.to_string(),
            headers: echoed,
            body: None,
        }
    }

    fn request_json(&self) -> Value {
        serde_json::json!({
            "method": self.method,
            "uri": self.uri,
            "headers": self.headers,
        })
    }
}

/// A [`RelayError`] paired with the request that caused it.
#[derive(Debug)]
pub struct Rejection {
    /// What went wrong.
    pub error: RelayError,
    /// The offending request.
    pub echo: RequestEcho,
}

impl Rejection {
    /// Pair `error` with `echo`.
    pub const fn new(error: RelayError, echo: RequestEcho) -> Self {
        Self { error, echo }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let kind = self.error.kind();

        if let RelayError::Internal(detail) = &self.error {
            tracing::error!(kind, error = %detail, method = %self.echo.method, "Request failed");
        } else {
            tracing::warn!(kind, msg = %self.error, method = %self.echo.method, "Request rejected");
        }

        let mut body = Map::new();
        body.insert("msg".to_owned(), Value::String(self.error.to_string()));
        body.insert("kind".to_owned(), Value::String(kind.to_owned()));
        body.insert("req".to_owned(), self.echo.request_json());
        if let Some(echoed) = self.echo.body {
            body.insert("body".to_owned(), echoed);
        }
        if let RelayError::Internal(detail) = self.error {
            body.insert("err".to_owned(), Value::String(detail));
        }

        (status, axum::Json(Value::Object(body))).into_response()
    }
}
