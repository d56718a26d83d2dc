//! Upload and classification tests.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use image::ImageFormat;

use roadscan::classifier::{Classifier, ModelStatus};
use roadscan::images::repo::list_images_by_filename;

use super::test_utils::{
    image_bytes, json_body, login_token, test_app, upload_request, ChannelMeanModel,
};

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_upload_without_token_is_rejected() {
    let app = test_app(Classifier::Placeholder).await;
    let png = image_bytes([10, 20, 30], ImageFormat::Png);

    let response = app.send(upload_request(None, "file", "road.png", &png)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Unauthorized");
    assert_eq!(app.image_count().await, 0);
}

#[tokio::test]
async fn test_upload_with_tampered_token_is_rejected() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "frank", "pw").await;

    // swap the signature for one computed over different content
    let (unsigned, _) = token.rsplit_once('.').unwrap();
    let tampered = format!("{}.{}", unsigned, "c2lnbmF0dXJlLXRoYXQtZG9lcy1ub3QtbWF0Y2g");

    let png = image_bytes([10, 20, 30], ImageFormat::Png);
    let response = app
        .send(upload_request(Some(&tampered), "file", "road.png", &png))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.stored_files().is_empty());
}

#[tokio::test]
async fn test_upload_with_non_bearer_scheme_is_rejected() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "gina", "pw").await;
    let png = image_bytes([10, 20, 30], ImageFormat::Png);

    let mut request = upload_request(None, "file", "road.png", &png);
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Token {}", token).parse().unwrap(),
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_disallowed_extension_writes_nothing() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "hank", "pw").await;

    let response = app
        .send(upload_request(Some(&token), "file", "pothole.gif", b"GIF89a..."))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid file");
    assert!(app.stored_files().is_empty());
    assert_eq!(app.image_count().await, 0);
}

#[tokio::test]
async fn test_missing_file_field() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "ivy", "pw").await;
    let png = image_bytes([1, 2, 3], ImageFormat::Png);

    let response = app
        .send(upload_request(Some(&token), "picture", "road.png", &png))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file provided");
}

#[tokio::test]
async fn test_undecodable_image_writes_nothing() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "jack", "pw").await;

    let response = app
        .send(upload_request(Some(&token), "file", "broken.jpg", b"not really a jpeg"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid image");
    assert!(app.stored_files().is_empty());
    assert_eq!(app.image_count().await, 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "kim", "pw").await;

    // test config caps bodies at 1 MiB
    let big = vec![0u8; 2 * 1024 * 1024];
    let response = app
        .send(upload_request(Some(&token), "file", "huge.png", &big))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(app.image_count().await, 0);
}

#[tokio::test]
async fn test_non_multipart_body_is_bad_request() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "lee", "pw").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Classification
// =============================================================================

#[tokio::test]
async fn test_placeholder_classifies_unknown_and_records_once() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "mia", "pw").await;
    let png = image_bytes([120, 120, 120], ImageFormat::Png);

    let response = app
        .send(upload_request(Some(&token), "file", "road.png", &png))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["filename"], "road.png");
    assert_eq!(body["category"], "unknown");
    assert_eq!(body["confidence"], 0.0);

    assert_eq!(app.image_count().await, 1);
    let records = list_images_by_filename(&app.state.db, "road.png").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "unknown");
    assert_eq!(app.stored_files(), vec![records[0].storage_key.clone()]);
    assert_eq!(
        std::fs::read(app.upload_dir.path().join(&records[0].storage_key)).unwrap(),
        png
    );
}

#[tokio::test]
async fn test_loaded_model_picks_dominant_channel() {
    let app = test_app(Classifier::with_model(ChannelMeanModel)).await;
    let token = login_token(&app, "noah", "pw").await;

    // red-dominant image -> index 0 -> minor; blue-dominant -> index 2 -> major
    let red = image_bytes([250, 10, 10], ImageFormat::Png);
    let blue = image_bytes([10, 10, 250], ImageFormat::Jpeg);

    let body = json_body(app.send(upload_request(Some(&token), "file", "red.png", &red)).await).await;
    assert_eq!(body["category"], "minor");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!(confidence > 33.34 && confidence <= 100.0);

    let body = json_body(app.send(upload_request(Some(&token), "file", "blue.JPG", &blue)).await).await;
    assert_eq!(body["category"], "major");
}

#[tokio::test]
async fn test_repeated_uploads_are_deterministic() {
    let app = test_app(Classifier::with_model(ChannelMeanModel)).await;
    let token = login_token(&app, "olga", "pw").await;
    let png = image_bytes([90, 160, 40], ImageFormat::Png);

    let first = json_body(app.send(upload_request(Some(&token), "file", "same.png", &png)).await).await;
    let second = json_body(app.send(upload_request(Some(&token), "file", "same.png", &png)).await).await;

    assert_eq!(first["category"], "moderate");
    assert_eq!(first["category"], second["category"]);
    assert_eq!(first["confidence"], second["confidence"]);
}

#[tokio::test]
async fn test_same_name_uploads_do_not_overwrite() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "pete", "pw").await;

    let a = image_bytes([1, 1, 1], ImageFormat::Png);
    let b = image_bytes([200, 200, 200], ImageFormat::Png);
    for data in [&a, &b] {
        let response = app
            .send(upload_request(Some(&token), "file", "dup.png", data))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let records = list_images_by_filename(&app.state.db, "dup.png").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].storage_key, records[1].storage_key);
    assert_eq!(app.stored_files().len(), 2);
}

#[tokio::test]
async fn test_traversal_filename_is_sanitized() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "quinn", "pw").await;
    let png = image_bytes([5, 5, 5], ImageFormat::Png);

    let response = app
        .send(upload_request(Some(&token), "file", "../../etc/road.png", &png))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["filename"], "etc_road.png");

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("-etc_road.png"));
}

#[tokio::test]
async fn test_long_filename_is_stored_under_a_bounded_key() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "rosa", "pw").await;
    let png = image_bytes([30, 30, 30], ImageFormat::Png);
    let name = format!("{}.png", "a".repeat(230));

    let response = app
        .send(upload_request(Some(&token), "file", &name, &png))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["filename"], name.as_str());

    let files = app.stored_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].len() <= 255);
    assert!(files[0].ends_with(".png"));

    let records = list_images_by_filename(&app.state.db, &name).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].storage_key, files[0]);
}

#[tokio::test]
async fn test_onnx_model_classifies_uploads() {
    let model = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/channel_mean.onnx");
    let classifier = Classifier::load(&model);
    assert_eq!(classifier.status(), ModelStatus::Loaded);

    let app = test_app(classifier).await;
    let token = login_token(&app, "sven", "pw").await;
    let green = image_bytes([10, 220, 10], ImageFormat::Png);

    let response = app
        .send(upload_request(Some(&token), "file", "green.png", &green))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["category"], "moderate");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!(confidence > 33.34 && confidence < 100.0);
}

// =============================================================================
// Persistence failures
// =============================================================================

#[tokio::test]
async fn test_failed_insert_removes_stored_file() {
    let app = test_app(Classifier::Placeholder).await;
    let token = login_token(&app, "tara", "pw").await;
    sqlx::query("DROP TABLE images")
        .execute(&app.state.db)
        .await
        .unwrap();

    let png = image_bytes([40, 40, 40], ImageFormat::Png);
    let response = app
        .send(upload_request(Some(&token), "file", "road.png", &png))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"], "Internal server error");
    assert!(app.stored_files().is_empty());
}
