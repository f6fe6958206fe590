//! Integration tests for the relay endpoint.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates preconditions, dispatch, and
//! response rendering without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use moverelay_gateway::router::build_router;
use moverelay_gateway::state::AppState;
use moverelay_store::{FileLogStore, LogStore, MemoryLogStore};
use serde_json::{json, Value};
use tower::ServiceExt;

fn make_router() -> (Router, Arc<dyn LogStore>) {
    let store: Arc<dyn LogStore> = Arc::new(MemoryLogStore::new());
    let state = Arc::new(AppState::new(Arc::clone(&store)));
    (build_router(state), store)
}

fn post_json(body: &Value) -> Request<Body> {
    Request::post("/")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    assert_eq!(
        response.headers()["content-type"],
        "application/json",
        "every response must be JSON"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =========================================================================
// End-to-end scenario
// =========================================================================

#[tokio::test]
async fn test_alice_scenario() {
    let (router, _) = make_router();

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "submit", "username": "alice", "key": "1", "move": "e4"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let msg = body["msg"].as_str().unwrap();
    assert!(msg.contains("alice") && msg.contains('1'), "{msg}");

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "query", "username": "alice", "key": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["move"], "e4");

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "query", "username": "alice", "key": "2"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "KeyNotFound");

    let (status, _) = send(
        &router,
        post_json(&json!({"action": "clear", "username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "query", "username": "alice", "key": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "LogNotFound");
}

#[tokio::test]
async fn test_query_unknown_user_is_log_not_found() {
    let (router, _) = make_router();
    let (status, body) = send(
        &router,
        post_json(&json!({"action": "query", "username": "nobody", "key": "move-001"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "LogNotFound");
    assert_eq!(body["msg"], "No move log found for 'nobody'.");
    assert_eq!(body["body"]["username"], "nobody");
    assert!(body.get("err").is_none());
}

#[tokio::test]
async fn test_structured_move_round_trips() {
    let (router, _) = make_router();
    let mv = json!({"fr": [6, 4], "to": [4, 4], "capture": false});

    send(
        &router,
        post_json(&json!({"action": "submit", "username": "bob", "key": "move-007", "move": mv})),
    )
    .await;
    let (status, body) = send(
        &router,
        post_json(&json!({"action": "query", "username": "bob", "key": "move-007"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["move"], mv);
}

#[tokio::test]
async fn test_clear_unknown_user_succeeds() {
    let (router, _) = make_router();
    let (status, body) = send(
        &router,
        post_json(&json!({"action": "clear", "username": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg"], "Move log for 'ghost' successfully cleared.");
}

// =========================================================================
// Save
// =========================================================================

#[tokio::test]
async fn test_save_returns_snapshot_id() {
    let (router, _) = make_router();
    send(
        &router,
        post_json(&json!({"action": "submit", "username": "alice", "key": "1", "move": "e4"})),
    )
    .await;

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "save", "username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["snapshot"].as_str().unwrap();
    assert!(body["msg"].as_str().unwrap().contains(id));

    // The live ledger is still there.
    let (status, _) = send(
        &router,
        post_json(&json!({"action": "query", "username": "alice", "key": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_save_unknown_user_is_not_found() {
    let (router, _) = make_router();
    let (status, body) = send(
        &router,
        post_json(&json!({"action": "save", "username": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "LogNotFound");
}

// =========================================================================
// Preconditions and decode failures
// =========================================================================

#[tokio::test]
async fn test_get_is_bad_method() {
    let (router, _) = make_router();
    let (status, body) = send(&router, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BadMethod");
    assert_eq!(body["msg"], "Expected 'POST', got 'GET'.");
    assert_eq!(body["req"]["method"], "GET");
}

#[tokio::test]
async fn test_preflight_options_is_bad_method() {
    let (router, _) = make_router();
    let request = Request::options("/")
        .header("origin", "http://example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BadMethod");
    assert_eq!(body["msg"], "Expected 'POST', got 'OPTIONS'.");
    assert_eq!(body["req"]["headers"]["origin"], "http://example.com");
}

#[tokio::test]
async fn test_wrong_content_type_is_rejected() {
    let (router, _) = make_router();
    let request = Request::post("/")
        .header("content-type", "text/plain")
        .body(Body::from(r#"{"action":"clear","username":"alice"}"#))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BadContentType");
    assert_eq!(body["req"]["headers"]["content-type"], "text/plain");
}

#[tokio::test]
async fn test_missing_content_type_is_rejected() {
    let (router, _) = make_router();
    let request = Request::post("/").body(Body::from("{}")).unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BadContentType");
}

#[tokio::test]
async fn test_charset_parameter_is_accepted() {
    let (router, _) = make_router();
    let request = Request::post("/")
        .header("content-type", "application/json; charset=utf-8")
        .body(Body::from(r#"{"action":"clear","username":"alice"}"#))
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_is_decode_failure() {
    let (router, _) = make_router();
    let request = Request::post("/")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "DecodeFailure");
    assert_eq!(body["body"], "{not json");
}

#[tokio::test]
async fn test_oversized_body_is_decode_failure() {
    let store: Arc<dyn LogStore> = Arc::new(MemoryLogStore::new());
    let state = Arc::new(AppState::new(store).with_max_body_bytes(16));
    let router = build_router(state);

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "submit", "username": "alice", "key": "1", "move": "e4"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "DecodeFailure");
}

#[tokio::test]
async fn test_unknown_action_echoes_value() {
    let (router, _) = make_router();
    let (status, body) = send(
        &router,
        post_json(&json!({"action": "teleport", "username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "UnknownAction");
    assert!(body["msg"].as_str().unwrap().contains("teleport"));
    assert_eq!(body["body"]["action"], "teleport");
}

#[tokio::test]
async fn test_null_and_numeric_actions_are_unknown() {
    let (router, store) = make_router();
    for (action, shown) in [(Value::Null, "null"), (json!(5), "5")] {
        let (status, body) = send(
            &router,
            post_json(&json!({"action": action, "username": "alice", "key": "1", "move": "e4"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "UnknownAction");
        assert_eq!(body["msg"], format!("Unknown action: '{shown}'."));
        assert_eq!(body["body"]["action"], action);
    }
    assert!(store.lookup("alice", "1").is_err());
}

#[tokio::test]
async fn test_missing_field_is_client_error() {
    let (router, store) = make_router();
    let (status, body) = send(
        &router,
        post_json(&json!({"action": "submit", "username": "alice", "move": "e4"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "MissingField");
    assert_eq!(
        body["msg"],
        "Missing required field 'key' for action 'submit'."
    );
    assert!(store.lookup("alice", "1").is_err());
}

#[tokio::test]
async fn test_any_path_reaches_the_relay() {
    let (router, _) = make_router();
    let request = Request::post("/scserver/post")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"action":"clear","username":"alice"}"#))
        .unwrap();
    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
}

// =========================================================================
// Storage failures and concurrency
// =========================================================================

#[tokio::test]
async fn test_storage_failure_is_internal_with_detail() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLogStore::open(dir.path().join("ledgers"), dir.path().join("snapshots"))
        .unwrap();
    // A directory where the ledger file should be makes every read fail.
    std::fs::create_dir(store.ledger_path("alice")).unwrap();
    let router = build_router(Arc::new(AppState::new(Arc::new(store))));

    let (status, body) = send(
        &router,
        post_json(&json!({"action": "submit", "username": "alice", "key": "1", "move": "e4"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "InternalFailure");
    assert!(!body["err"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_submits_for_one_user_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn LogStore> = Arc::new(
        FileLogStore::open(dir.path().join("ledgers"), dir.path().join("snapshots")).unwrap(),
    );
    let router = build_router(Arc::new(AppState::new(Arc::clone(&store))));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                let request = post_json(&json!({
                    "action": "submit",
                    "username": "alice",
                    "key": format!("move-{i:03}"),
                    "move": i,
                }));
                router.oneshot(request).await.unwrap().status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(store.ensure("alice").unwrap().len(), 20);
}
