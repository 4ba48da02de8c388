// HTTP contract tests for the chat server
// Requests go straight through the router with tower's oneshot

mod common;
use common::{
    call, fixed_clock, get, messages_of, post_json, router_with_clock, router_with_store,
    test_router, TEST_ORIGIN,
};

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Duration;
use serde_json::json;

use duochat::error::{ChatError, ChatResult};
use duochat::models::Message;
use duochat::store::MessageStore;

const MESSAGES: &str = "/api/chat/messages";

#[tokio::test]
async fn test_health_reports_ok() {
    let router = test_router();
    let (status, _, body) = call(&router, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "message": "Server is running" }));
}

#[tokio::test]
async fn test_fresh_store_scenario() {
    let router = test_router();

    let (status, _, body) = call(&router, get(MESSAGES)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _, body) = call(&router, post_json(MESSAGES, r#"{"text":"hi"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = messages_of(&body);
    let ids: Vec<u64> = created.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let (status, _, body) = call(&router, get(MESSAGES)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages_of(&body), created);
}

#[tokio::test]
async fn test_post_returns_user_message_and_echo() {
    let router = router_with_clock(fixed_clock("2025-05-20T12:00:00.000Z"));

    let (status, _, body) = call(&router, post_json(MESSAGES, r#"{"text":"hello"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);

    let created = messages_of(&body);
    assert_eq!(created.len(), 2);
    assert_eq!(created[0].text, "hello");
    assert_eq!(created[0].sender, "Anonymous");
    assert_eq!(created[1].text, "Server: hello");
    assert_eq!(created[1].sender, "server");
    assert_eq!(created[1].timestamp - created[0].timestamp, Duration::milliseconds(1000));

    // Wire format is millisecond ISO-8601 in UTC
    assert_eq!(body[0]["timestamp"], "2025-05-20T12:00:00.000Z");
    assert_eq!(body[1]["timestamp"], "2025-05-20T12:00:01.000Z");
}

#[tokio::test]
async fn test_post_keeps_given_sender() {
    let router = test_router();
    let (_, _, body) = call(
        &router,
        post_json(MESSAGES, r#"{"text":"yo","sender":"me"}"#),
    )
    .await;

    let created = messages_of(&body);
    assert_eq!(created[0].sender, "me");
    assert_eq!(created[1].sender, "server");
}

#[tokio::test]
async fn test_ids_exceed_all_previous_ids() {
    let router = test_router();
    let mut highest = 0;

    for text in ["a", "b", "a"] {
        let body = json!({ "text": text }).to_string();
        let (status, _, body) = call(&router, post_json(MESSAGES, &body)).await;
        assert_eq!(status, StatusCode::CREATED);

        let created = messages_of(&body);
        assert!(created[0].id > highest);
        assert!(created[1].id > created[0].id);
        highest = created[1].id;
    }

    // Duplicate text made a duplicate pair, not a conflict
    let (_, _, body) = call(&router, get(MESSAGES)).await;
    assert_eq!(messages_of(&body).len(), 6);
}

#[tokio::test]
async fn test_missing_text_is_rejected_and_nothing_appended() {
    let router = test_router();
    call(&router, post_json(MESSAGES, r#"{"text":"first"}"#)).await;

    for payload in ["", "  ", r#"{}"#, r#"{"text":""}"#, r#"{"text":null}"#, r#"{"sender":"me"}"#] {
        let (status, _, body) = call(&router, post_json(MESSAGES, payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert_eq!(body, json!({ "error": "Message text is required" }));
    }

    let (_, _, body) = call(&router, get(MESSAGES)).await;
    assert_eq!(messages_of(&body).len(), 2);
}

#[tokio::test]
async fn test_post_without_json_body_is_missing_text() {
    let router = test_router();
    let request = Request::builder()
        .method("POST")
        .uri(MESSAGES)
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = call(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message text is required");
}

#[tokio::test]
async fn test_malformed_body_is_a_client_error() {
    let router = test_router();

    for payload in [r#"{"text": "#, r#"{"text": 5}"#, r#"["hi"]"#, r#"["hi","bob"]"#, r#""hi""#] {
        let (status, _, body) = call(&router, post_json(MESSAGES, payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {}", payload);
        assert!(body["error"].is_string());
    }

    let (_, _, body) = call(&router, get(MESSAGES)).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_array_body_is_not_read_as_a_message() {
    let router = test_router();

    let (status, _, body) = call(&router, post_json(MESSAGES, r#"["hi","bob"]"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Request body must be a JSON object" }));

    let (_, _, body) = call(&router, get(MESSAGES)).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let router = test_router();
    let (status, _, body) = call(&router, get("/api/chat/rooms")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No route for /api/chat/rooms");
}

struct BrokenStore;

#[async_trait]
impl MessageStore for BrokenStore {
    async fn list_messages(&self) -> ChatResult<Vec<Message>> {
        Err(ChatError::Storage("disk on fire".to_string()))
    }

    async fn append_user_message(&self, _text: &str, _sender: &str) -> ChatResult<[Message; 2]> {
        panic!("append exploded");
    }
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let router = router_with_store(Arc::new(BrokenStore));
    let (status, _, body) = call(&router, get(MESSAGES)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    // Internal detail stays in the server log
    assert_eq!(body, json!({ "error": "Something went wrong!" }));
}

#[tokio::test]
async fn test_handler_panic_is_generic_500() {
    let router = router_with_store(Arc::new(BrokenStore));
    let (status, _, body) = call(&router, post_json(MESSAGES, r#"{"text":"boom"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Something went wrong!" }));
}

#[tokio::test]
async fn test_cors_preflight_from_allowed_origin() {
    let router = test_router();
    let request = Request::builder()
        .method("OPTIONS")
        .uri(MESSAGES)
        .header("origin", TEST_ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = call(&router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(headers["access-control-allow-origin"], TEST_ORIGIN);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    assert_eq!(headers["access-control-allow-methods"], "GET,POST,OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type,Authorization");
}

#[tokio::test]
async fn test_cors_ignores_foreign_origin() {
    let router = test_router();
    let request = Request::builder()
        .method("GET")
        .uri(MESSAGES)
        .header("origin", "http://evil.example")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = call(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("access-control-allow-origin").is_none());
    assert!(headers.get("access-control-allow-credentials").is_none());
}

#[tokio::test]
async fn test_cors_headers_on_regular_and_error_responses() {
    let router = test_router();
    let request = Request::builder()
        .method("POST")
        .uri(MESSAGES)
        .header("origin", TEST_ORIGIN)
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, headers, _) = call(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers["access-control-allow-origin"], TEST_ORIGIN);
    assert_eq!(headers["access-control-allow-credentials"], "true");
    // Method/header lists are only sent on preflight
    assert!(headers.get("access-control-allow-methods").is_none());
}
