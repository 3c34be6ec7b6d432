use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use drop_store::config::ServerConfig;
use drop_store::services::storage::LocalFileStore;
use drop_store::{AppState, create_app};
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup_app(storage: &Path) -> Router {
    let store = LocalFileStore::open(storage).await.unwrap();
    create_app(AppState::new(
        Arc::new(store),
        ServerConfig::development(storage),
    ))
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn listed_names(app: &Router) -> Vec<String> {
    let (status, json) = send(app, "GET", "/api/list").await;
    assert_eq!(status, StatusCode::OK);
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["fileName"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_delete_then_list() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(dir.path()).await;
    tokio::fs::write(dir.path().join("keep.txt"), b"keep").await.unwrap();
    tokio::fs::write(dir.path().join("drop.txt"), b"drop").await.unwrap();

    assert_eq!(listed_names(&app).await, vec!["drop.txt", "keep.txt"]);

    let (status, json) = send(&app, "DELETE", "/api/delete?name=drop.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["statusCode"], 200);
    assert_eq!(json["statusMessage"], "File deleted successfully");
    assert!(json["data"].is_null());

    assert_eq!(listed_names(&app).await, vec!["keep.txt"]);
    assert!(!dir.path().join("drop.txt").exists());
}

#[tokio::test]
async fn test_delete_unknown_file() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(dir.path()).await;
    tokio::fs::write(dir.path().join("keep.txt"), b"keep").await.unwrap();

    let (status, json) = send(&app, "DELETE", "/api/delete?name=never-uploaded.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["statusCode"], 404);

    assert_eq!(listed_names(&app).await, vec!["keep.txt"]);
}

#[tokio::test]
async fn test_delete_requires_name() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(dir.path()).await;

    for uri in ["/api/delete", "/api/delete?name="] {
        let (status, json) = send(&app, "DELETE", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["statusMessage"], "File name is required");
    }
}

#[tokio::test]
async fn test_delete_cannot_escape_storage() {
    let dir = TempDir::new().unwrap();
    let storage = dir.path().join("uploads");
    let outside = dir.path().join("outside.txt");
    tokio::fs::write(&outside, b"do not touch").await.unwrap();
    let app = setup_app(&storage).await;

    for name in ["../outside.txt", "..%2Foutside.txt", "..", "sub%5C..%5Coutside.txt"] {
        let (status, _) = send(&app, "DELETE", &format!("/api/delete?name={}", name)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "name {}", name);
    }

    assert!(outside.exists());
}

#[tokio::test]
async fn test_delete_staging_directory_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(dir.path()).await;

    let (status, _) = send(&app, "DELETE", "/api/delete?name=.staging").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(dir.path().join(".staging").is_dir());
}

#[tokio::test]
async fn test_repeated_name_parameter_gets_envelope() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(dir.path()).await;
    tokio::fs::write(dir.path().join("a"), b"a").await.unwrap();

    let (status, json) = send(&app, "DELETE", "/api/delete?name=a&name=b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["statusCode"], 400);
    assert!(json["statusMessage"].is_string());
    assert!(dir.path().join("a").exists());
}
