//! The single relay endpoint.
//!
//! Every inbound request goes through [`relay`]:
//!
//! 1. reject anything that is not `POST`
//! 2. reject anything not declared as `application/json`
//! 3. read the full body, then decode it
//! 4. dispatch on a blocking worker and render the outcome
//!
//! Failures at any step become a JSON [`Rejection`]; nothing escapes as
//! a bare transport error.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::dispatch::dispatch;
use crate::error::{Rejection, RelayError, RequestEcho};
use crate::state::AppState;

/// Handle one relay request.
pub async fn relay(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let mut echo = RequestEcho::new(&method, &uri, &headers);

    if method != Method::POST {
        return Rejection::new(RelayError::BadMethod(method.to_string()), echo).into_response();
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
    if !content_type.as_deref().is_some_and(is_json_content_type) {
        return Rejection::new(RelayError::BadContentType(content_type), echo).into_response();
    }

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let error = RelayError::DecodeFailure(format!("failed to read body: {e}"));
            return Rejection::new(error, echo).into_response();
        }
    };

    let request: Value = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(e) => {
            echo.body = Some(Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            return Rejection::new(RelayError::DecodeFailure(e.to_string()), echo)
                .into_response();
        }
    };

    let store = Arc::clone(&state.store);
    let outcome = tokio::task::spawn_blocking(move || {
        let result = dispatch(store.as_ref(), &request);
        (request, result)
    })
    .await;

    match outcome {
        Ok((_, Ok(reply))) => {
            tracing::info!(msg = %reply.msg, "Request handled");
            reply.into_response()
        }
        Ok((request, Err(error))) => {
            echo.body = Some(request);
            Rejection::new(error, echo).into_response()
        }
        Err(e) => {
            Rejection::new(RelayError::Internal(format!("dispatch task failed: {e}")), echo)
                .into_response()
        }
    }
}

/// Whether a `Content-Type` value declares JSON. Parameters such as
/// `charset` are ignored; the media type compares case-insensitively.
pub fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}
