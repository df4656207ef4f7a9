#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use base64::Engine;
use chrono::NaiveDate;
use joke_of_the_day::{
    auth::{Role, UserAccount, UserDirectory},
    domain::FixedClock,
    hal::JokeModelAssembler,
    repositories::SqliteJokeRepository,
    routes::create_router,
    service::JokeService,
    startup::{connect_pool, init_schema},
    AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).expect("valid test date")
}

/// A service over a fresh in-memory database whose "today" is 2024-01-01.
pub async fn create_test_service() -> JokeService {
    let pool = connect_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to connect to test database");
    init_schema(&pool).await.expect("Failed to create schema");
    JokeService::new(
        Arc::new(SqliteJokeRepository::new(pool)),
        Arc::new(FixedClock(day(1))),
    )
}

pub async fn create_test_router() -> Router {
    let state = AppState {
        service: create_test_service().await,
        assembler: JokeModelAssembler::new("http://localhost:3000"),
        users: UserDirectory::new(vec![
            UserAccount::new("user", "secret", Role::User),
            UserAccount::new("admin", "secret", Role::Admin),
        ]),
        demo: true,
    };
    create_router(Arc::new(state))
}

pub fn basic(user: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{}:secret", user));
    format!("Basic {}", encoded)
}

pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, basic(user));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn send(router: &Router, req: Request<Body>) -> Response<Body> {
    router.clone().oneshot(req).await.expect("router is infallible")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("UTF-8 body")
}

/// Creates a joke as admin and returns the response JSON.
pub async fn create_joke(router: &Router, date: &str, joke: &str) -> Value {
    let body = serde_json::json!({ "date": date, "joke": joke, "description": "" });
    let response = send(router, request("POST", "/api/v1/jokes", Some("admin"), Some(body))).await;
    assert_eq!(response.status(), 201, "creating joke for {date}");
    body_json(response).await
}
