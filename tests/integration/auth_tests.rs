//! Registration and login tests.

use axum::http::StatusCode;
use jsonwebtoken::{decode, DecodingKey, Validation};
use time::OffsetDateTime;

use roadscan::auth::Claims;
use roadscan::classifier::Classifier;

use super::test_utils::{
    json_body, json_request, register, test_app, TEST_AUDIENCE, TEST_ISSUER, TEST_SECRET,
};

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_then_duplicate() {
    let app = test_app(Classifier::Placeholder).await;

    let first = app
        .send(json_request(
            "/api/register",
            serde_json::json!({ "username": "alice", "password": "s3cret" }),
        ))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(json_body(first).await["message"], "User registered successfully");

    let second = app
        .send(json_request(
            "/api/register",
            serde_json::json!({ "username": "alice", "password": "different" }),
        ))
        .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(second).await["error"], "Username already exists");

    let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind("alice")
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = test_app(Classifier::Placeholder).await;

    for body in [
        serde_json::json!({ "username": "bob" }),
        serde_json::json!({ "password": "pw" }),
        serde_json::json!({ "username": "", "password": "pw" }),
        serde_json::json!({}),
    ] {
        let response = app.send(json_request("/api/register", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing username or password");
    }
}

#[tokio::test]
async fn test_register_stores_hash_not_password() {
    let app = test_app(Classifier::Placeholder).await;
    assert_eq!(register(&app, "carol", "plaintext-pw").await, StatusCode::CREATED);

    let (hash,): (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE username = ?")
        .bind("carol")
        .fetch_one(&app.state.db)
        .await
        .unwrap();
    assert_ne!(hash, "plaintext-pw");
    assert!(hash.starts_with("$argon2"));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_issues_day_long_token() {
    let app = test_app(Classifier::Placeholder).await;
    assert_eq!(register(&app, "dana", "pw-dana").await, StatusCode::CREATED);

    let response = app
        .send(json_request(
            "/api/login",
            serde_json::json!({ "username": "dana", "password": "pw-dana" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["redirect"], "/dashboard");

    let mut validation = Validation::default();
    validation.set_audience(&[TEST_AUDIENCE]);
    validation.set_issuer(&[TEST_ISSUER]);
    let claims = decode::<Claims>(
        body["token"].as_str().unwrap(),
        &DecodingKey::from_secret(TEST_SECRET.as_bytes()),
        &validation,
    )
    .unwrap()
    .claims;

    assert_eq!(claims.username, "dana");
    let now = OffsetDateTime::now_utc().unix_timestamp() as i64;
    let ahead = claims.exp as i64 - now;
    assert!((24 * 3600 - 60..=24 * 3600 + 60).contains(&ahead), "exp {} s ahead", ahead);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test_app(Classifier::Placeholder).await;
    assert_eq!(register(&app, "erin", "right").await, StatusCode::CREATED);

    let wrong_password = app
        .send(json_request(
            "/api/login",
            serde_json::json!({ "username": "erin", "password": "wrong" }),
        ))
        .await;
    let unknown_user = app
        .send(json_request(
            "/api/login",
            serde_json::json!({ "username": "nobody", "password": "right" }),
        ))
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(wrong_password).await, json_body(unknown_user).await);
}

#[tokio::test]
async fn test_login_missing_fields_is_unauthorized() {
    let app = test_app(Classifier::Placeholder).await;
    let response = app
        .send(json_request("/api/login", serde_json::json!({ "username": "x" })))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
