use super::*;
use crate::state::test_helpers;
use axum::body::{Body, to_bytes};
use axum::http::Request;
use tower::ServiceExt;

async fn get_body(uri: &str) -> (StatusCode, String) {
    let h = test_helpers::harness();
    let response = app(h.state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn healthz_is_ok() {
    let (status, _) = get_body("/healthz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn homepage_renders_three_feature_columns() {
    let (status, body) = get_body("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.matches("<div class=\"col col--4\">").count(), 3);
    let dup = body.find("<h3>Duplicate Detection</h3>").unwrap();
    let pr = body.find("<h3>Pull Request Feedback</h3>").unwrap();
    let oss = body.find("<h3>Open Source</h3>").unwrap();
    assert!(dup < pr && pr < oss);
}

#[tokio::test]
async fn features_api_lists_blocks_in_order() {
    let (status, body) = get_body("/api/features").await;
    assert_eq!(status, StatusCode::OK);
    let blocks: serde_json::Value = serde_json::from_str(&body).unwrap();
    let headings: Vec<&str> = blocks
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["heading"].as_str().unwrap())
        .collect();
    assert_eq!(headings, vec!["Duplicate Detection", "Pull Request Feedback", "Open Source"]);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (status, _) = get_body("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
