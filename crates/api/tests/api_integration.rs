//! API integration tests.
//!
//! These drive the full router against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use podium_api::{AppState, extractors::DEVICE_COOKIE, middleware::MANAGE_PASSWORD_HEADER, router};
use podium_core::{InMemoryAttemptLimiter, Services, hash_password};
use podium_db::entities::show;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
use serde_json::Value as Json;
use tower::ServiceExt;

fn show(password: Option<&str>) -> show::Model {
    show::Model {
        id: "show1".to_string(),
        slug: "gala".to_string(),
        name: "Gala".to_string(),
        password: password.map(|p| hash_password(p).unwrap()),
        created_at: Utc::now().into(),
        updated_at: Utc::now().into(),
    }
}

fn create_test_router(db: DatabaseConnection) -> Router {
    let limiter = Arc::new(InMemoryAttemptLimiter::new(5, Duration::from_secs(15 * 60)));
    let state = AppState::new(Services::new(Arc::new(db), limiter), false);
    router(&state).with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

async fn body_json(response: axum::response::Response) -> Json {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_show_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<show::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/shows/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_ballot_lookup_issues_device_cookie() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/categories/cat1/ballot")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(&format!("{DEVICE_COOKIE}=")));
    assert!(cookie.contains("HttpOnly"));

    let body = body_json(response).await;
    assert_eq!(body["data"]["hasVoted"], false);
    assert!(body["data"]["nomination"].is_null());
}

#[tokio::test]
async fn test_cast_ballot_without_cookie_is_unauthorized() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ballots")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"nominationId":"nom1"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_show_rejects_bad_slug() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shows")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name":"Gala","slug":"Not A Slug"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_open_show() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[show(None)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/shows/gala/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["success"], true);
}

#[tokio::test]
async fn test_manage_route_rejects_wrong_password() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[show(Some("letmein"))]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/manage/gala/reset")
                .header(MANAGE_PASSWORD_HEADER, "guess")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_manage_reset_with_password() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[show(Some("letmein"))]])
        .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/manage/gala/reset")
                .header(MANAGE_PASSWORD_HEADER, "letmein")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["deleted"], 0);
}
