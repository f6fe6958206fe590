//! Action dispatch over a decoded request object.
//!
//! [`dispatch`] reads the `action` field of a request and maps it onto
//! the matching [`LogStore`] operation. It does no transport work: the
//! result is either a [`Reply`] or a [`RelayError`], and the gateway
//! decides how to render it.
//!
//! | Action | Fields | Store operation |
//! |--------|--------|-----------------|
//! | `submit` | `username`, `key`, `move` | [`LogStore::upsert`] |
//! | `query` | `username`, `key` | [`LogStore::lookup`] |
//! | `clear` | `username` | [`LogStore::clear`] |
//! | `save` | `username` | [`LogStore::snapshot`] |

use axum::response::{IntoResponse, Response};
use axum::Json;
use moverelay_store::LogStore;
use serde::Serialize;
use serde_json::Value;

use crate::error::RelayError;

/// The closed set of actions a request can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Record a move under a key.
    Submit,
    /// Fetch the move stored under a key.
    Query,
    /// Delete a user's move log.
    Clear,
    /// Copy a user's move log into a snapshot.
    Save,
}

impl Action {
    /// Resolve an `action` value. Only the exact lowercase names match.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_str()? {
            "submit" => Some(Self::Submit),
            "query" => Some(Self::Query),
            "clear" => Some(Self::Clear),
            "save" => Some(Self::Save),
            _ => None,
        }
    }

    /// The wire name of the action.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Query => "query",
            Self::Clear => "clear",
            Self::Save => "save",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful outcome of a dispatched request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// Human-readable summary.
    pub msg: String,
    /// The stored move (`query` only).
    #[serde(rename = "move", skip_serializing_if = "Option::is_none")]
    pub recorded: Option<Value>,
    /// Identifier of the new snapshot (`save` only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
}

impl Reply {
    const fn message(msg: String) -> Self {
        Self {
            msg,
            recorded: None,
            snapshot: None,
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Dispatch one decoded request against `store`.
///
/// # Errors
///
/// - [`RelayError::UnknownAction`] if `action` is absent or unrecognized
/// - [`RelayError::MissingField`] if a required field is absent, or
///   `username`/`key` is not a string
/// - [`RelayError::LogNotFound`] / [`RelayError::KeyNotFound`] from
///   `query` and `save`
/// - [`RelayError::Internal`] for storage failures
pub fn dispatch(store: &dyn LogStore, request: &Value) -> Result<Reply, RelayError> {
    let raw_action = request.get("action").cloned().unwrap_or(Value::Null);
    let Some(action) = Action::from_value(&raw_action) else {
        return Err(RelayError::UnknownAction(raw_action));
    };

    match action {
        Action::Submit => {
            let username = string_field(request, action, "username")?;
            let key = string_field(request, action, "key")?;
            let recorded = request.get("move").cloned().ok_or(RelayError::MissingField {
                action,
                field: "move",
            })?;
            store.upsert(username, key, recorded)?;
            Ok(Reply::message(format!(
                "Move from '{username}' with key '{key}' successfully recorded."
            )))
        }
        Action::Query => {
            let username = string_field(request, action, "username")?;
            let key = string_field(request, action, "key")?;
            let recorded = store.lookup(username, key)?;
            Ok(Reply {
                recorded: Some(recorded),
                ..Reply::message(format!(
                    "Move from '{username}' with key '{key}' successfully found."
                ))
            })
        }
        Action::Clear => {
            let username = string_field(request, action, "username")?;
            let existed = store.clear(username)?;
            tracing::debug!(username, existed, "Clear dispatched");
            Ok(Reply::message(format!(
                "Move log for '{username}' successfully cleared."
            )))
        }
        Action::Save => {
            let username = string_field(request, action, "username")?;
            let id = store.snapshot(username)?.to_string();
            Ok(Reply {
                msg: format!("Move log for '{username}' successfully saved as '{id}'."),
                recorded: None,
                snapshot: Some(id),
            })
        }
    }
}

fn string_field<'a>(
    request: &'a Value,
    action: Action,
    field: &'static str,
) -> Result<&'a str, RelayError> {
    request
        .get(field)
        .and_then(Value::as_str)
        .ok_or(RelayError::MissingField { action, field })
}
