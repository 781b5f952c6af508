#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::limit::RequestBodyLimitLayer;

use viewset_sdk::{app_router, AppState, MemoryStore, ServerConfig, Store};

/// Test config: in-memory store, `/api` prefix, no sample data.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "memory".to_string(),
        seed_sample_data: false,
        ..ServerConfig::default()
    }
}

pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

/// Full application router over a fresh in-memory store, mirroring `main.rs`.
pub fn build_test_app() -> Router {
    build_test_app_with(memory_store())
}

pub fn build_test_app_with(store: Arc<dyn Store>) -> Router {
    let config = test_config();
    let limit = config.body_limit_bytes;
    let state = AppState {
        store,
        config: Arc::new(config),
    };
    app_router(state)
        .expect("app router")
        .layer(RequestBodyLimitLayer::new(limit))
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<&Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response {
    send(app, Method::POST, uri, None).await
}

pub async fn put_json(app: &Router, uri: &str, body: &Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
