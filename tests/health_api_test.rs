//! Health API tests

mod common;

use axum::http::StatusCode;
use common::{get, TestAppState};
use portcullis_core::config::AuthConfig;
use portcullis_core::state::Readiness;

#[tokio::test]
async fn test_health_check() {
    let app = TestAppState::new(AuthConfig::default()).router();

    let response = get(&app, "/health", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_follows_bootstrap() {
    let readiness = Readiness::pending();
    let app = TestAppState::with_readiness(AuthConfig::default(), readiness.clone()).router();

    let response = get(&app, "/ready", &[]).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    readiness.mark_ready();
    let response = get(&app, "/ready", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_disabled() {
    let app = TestAppState::new(AuthConfig::default()).router();

    let response = get(&app, "/metrics", &[]).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
