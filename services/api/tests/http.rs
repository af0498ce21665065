//! Drives the axum router in-process.

mod common;

use std::sync::Arc;

use api_lib::config::Config;
use api_lib::web::{self, state::AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::fixture;

fn app() -> (Router, common::Fixture) {
    let config = Config::from_lookup(|key| match key {
        "STORE_BACKEND" => Some("memory".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap();
    let f = fixture();
    let state = Arc::new(AppState {
        catalog: Arc::new(f.service.clone()),
        config: Arc::new(config),
    });
    (web::router(state), f)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    read(app.clone().oneshot(request).await.unwrap()).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Registers and logs in, returning the bearer token.
async fn login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "full_name": "Test User",
            "age": 30,
            "email": email,
            "password": "hunter22",
            "password_confirmation": "hunter22"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/users/login",
        None,
        Some(json!({ "email": email, "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn add_movie(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/movies",
        Some(token),
        Some(json!({ "title": title, "description": "A film.", "release_date": "1995-12-15" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_uses_the_envelope() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"], "healthy");
}

#[tokio::test]
async fn register_login_and_me() {
    let (app, _) = app();
    let token = login(&app, "ada@example.com").await;

    let (status, body) = send(&app, Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert_eq!(body["data"]["age"], 30);
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let (app, _) = app();
    login(&app, "ada@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users/register",
        None,
        Some(json!({
            "full_name": "Ada Again",
            "age": 40,
            "email": "ADA@example.com",
            "password": "x",
            "password_confirmation": "x"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let (app, _) = app();
    let movie = json!({ "title": "Heat", "description": "Crime." });

    let (status, body) = send(&app, Method::POST, "/movies", None, Some(movie.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 401);

    let (status, _) = send(&app, Method::POST, "/movies", Some("forged"), Some(movie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (app, _) = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = read(app.oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn watch_review_and_rating_flow() {
    let (app, _) = app();
    let owner = login(&app, "owner@example.com").await;
    let viewer = login(&app, "viewer@example.com").await;
    let id = add_movie(&app, &owner, "Heat").await;

    let review = json!({ "rating": 4, "review": "tense" });
    let uri = format!("/movies/{id}/reviews");
    let (status, _) = send(&app, Method::POST, &uri, Some(&viewer), Some(review.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, &format!("/movies/{id}/watch"), Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::POST, &uri, Some(&viewer), Some(json!({ "rating": 9 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, &uri, Some(&viewer), Some(review)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rating"], 4);

    let (status, body) = send(&app, Method::GET, &format!("/movies/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Heat");
    assert_eq!(body["data"]["rating_count"], 1);
    assert_eq!(body["data"]["rating_average"], 4.0);

    let (status, body) = send(&app, Method::GET, "/movies/sort/rating/desc", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::GET, "/movies/watched", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["movie_id"], id.as_str());

    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["review"], "tense");
}

#[tokio::test]
async fn ownership_is_enforced_over_http() {
    let (app, _) = app();
    let owner = login(&app, "owner@example.com").await;
    let stranger = login(&app, "stranger@example.com").await;
    let id = add_movie(&app, &owner, "Heat").await;
    let uri = format!("/movies/{id}");

    let patch = json!({ "title": "Heat (1995)" });
    let (status, _) = send(&app, Method::PATCH, &uri, Some(&stranger), Some(patch.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&owner), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Heat (1995)");

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_ids_and_bad_sorts() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/movies/not-a-uuid", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);

    let (status, _) = send(&app, Method::GET, "/movies?sort_by=title&direction=asc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/movies?direction=asc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/movies", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn cover_upload_reads_the_cover_field() {
    let (app, f) = app();
    let owner = login(&app, "owner@example.com").await;
    let id = add_movie(&app, &owner, "Heat").await;

    let boundary = "catalog-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"cover\"; filename=\"heat.png\"\r\n");
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(&[0x89, b'P', b'N', b'G']);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/movies/{id}/cover"))
        .header(header::AUTHORIZATION, format!("Bearer {owner}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = read(app.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cover_key"], format!("covers/{id}.png"));

    let puts = f.blobs.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].1, vec![0x89, b'P', b'N', b'G']);
    assert_eq!(puts[0].2, "image/png");
}
