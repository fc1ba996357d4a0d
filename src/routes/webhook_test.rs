use super::*;
use crate::routes::app;
use crate::state::test_helpers::{self, Harness};
use axum::body::{Body, to_bytes};
use axum::http::Request;
use std::time::Duration;
use tower::ServiceExt;

fn signed_request(event: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature::sign(test_helpers::TEST_SECRET.as_bytes(), body.as_bytes()));
    if let Some(event) = event {
        builder = builder.header(EVENT_HEADER, event);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(h: &Harness, request: Request<Body>) -> (StatusCode, String) {
    let response = app(h.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Wait for the spawned handler to post `count` comments.
async fn wait_for_comments(h: &Harness, count: usize) {
    for _ in 0..200 {
        if h.github.comments().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} comments, got {:?}", h.github.comments());
}

const ISSUE_OPENED: &str = r#"{
    "action": "opened",
    "installation": { "id": 9 },
    "repository": { "id": 42, "full_name": "octo/widgets" },
    "issue": { "number": 2, "title": "Crash at startup", "body": "app dies" }
}"#;

// =========================================================================
// Signature
// =========================================================================

#[tokio::test]
async fn missing_signature_is_rejected() {
    let h = test_helpers::harness();
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(EVENT_HEADER, "issues")
        .body(Body::from(ISSUE_OPENED))
        .unwrap();

    let (status, body) = send(&h, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Signature is missing");
}

#[tokio::test]
async fn wrong_signature_is_rejected() {
    let h = test_helpers::harness();
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(SIGNATURE_HEADER, signature::sign(b"wrong secret", ISSUE_OPENED.as_bytes()))
        .body(Body::from(ISSUE_OPENED))
        .unwrap();

    let (status, body) = send(&h, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid signature");
}

// =========================================================================
// Decoding
// =========================================================================

#[tokio::test]
async fn ping_without_event_header_succeeds() {
    let h = test_helpers::harness();
    let (status, body) = send(&h, signed_request(None, r#"{"zen":"Keep it logically awesome."}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"success"}"#);
}

#[tokio::test]
async fn missing_installation_is_rejected() {
    let h = test_helpers::harness();
    let (status, body) = send(&h, signed_request(Some("issues"), r#"{"action":"opened"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Installation ID is missing");
}

#[tokio::test]
async fn issue_without_repository_is_rejected() {
    let h = test_helpers::harness();
    let payload = r#"{"action":"opened","installation":{"id":9},"issue":{"number":1,"title":"t"}}"#;
    let (status, body) = send(&h, signed_request(Some("issues"), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Repository full name or ID is missing");
}

#[tokio::test]
async fn pull_request_without_repository_is_rejected() {
    let h = test_helpers::harness();
    let payload = r#"{"action":"opened","installation":{"id":9},"pull_request":{"number":1}}"#;
    let (status, body) = send(&h, signed_request(Some("pull_request"), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Repository information missing");
}

#[tokio::test]
async fn invalid_json_is_rejected() {
    let h = test_helpers::harness();
    let (status, _) = send(&h, signed_request(Some("issues"), "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[test]
fn every_event_error_is_a_bad_request() {
    assert_eq!(event_error_to_status(&EventError::MissingInstallation), StatusCode::BAD_REQUEST);
    assert_eq!(event_error_to_status(&EventError::MissingField("issue")), StatusCode::BAD_REQUEST);
}

// =========================================================================
// Dispatch
// =========================================================================

#[tokio::test]
async fn opened_issue_is_handled_in_background() {
    let h = test_helpers::harness();
    let existing = crate::vector::IssueRecord {
        number: 1,
        title: "App crashes on launch".into(),
        document: "App crashes on launch ".into(),
        embedding: vec![1.0, 0.0, 0.0],
    };
    crate::vector::VectorStore::upsert_issues(&h.store, 42, &[existing]).await.unwrap();
    h.embedder.register("Crash at startup app dies", vec![1.0, 0.0, 0.0]);

    let (status, body) = send(&h, signed_request(Some("issues"), ISSUE_OPENED)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"success"}"#);

    wait_for_comments(&h, 1).await;
    assert_eq!(
        h.github.comments()[0].2,
        "Closed due to high similarity with issue #1 with title 'App crashes on launch'"
    );
}

#[tokio::test]
async fn unhandled_event_types_are_accepted() {
    let h = test_helpers::harness();
    let payload = r#"{"action":"created","installation":{"id":9}}"#;
    let (status, _) = send(&h, signed_request(Some("star"), payload)).await;
    assert_eq!(status, StatusCode::OK);
}
