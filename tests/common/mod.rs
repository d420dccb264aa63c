#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use student_api::{app, AppState, CorsConfig, MemoryStudentStore, StudentStore};
use tower::ServiceExt;

pub const ORIGIN: &str = "http://localhost:5173";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!("body is not JSON ({}): {:?}", e, String::from_utf8_lossy(&self.body))
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn memory_app() -> Router {
    app_with_store(Arc::new(MemoryStudentStore::new()))
}

pub fn app_with_store(store: Arc<dyn StudentStore>) -> Router {
    app(AppState::new(store), &CorsConfig::default()).expect("default cors config is valid")
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri).header("origin", ORIGIN);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    send_request(app, builder.body(body).unwrap()).await
}

pub async fn send_raw(app: &Router, method: Method, uri: &str, body: &'static str) -> TestResponse {
    let req = Request::builder().method(method).uri(uri).body(Body::from(body)).unwrap();
    send_request(app, req).await
}

pub async fn send_request(app: &Router, req: Request<Body>) -> TestResponse {
    let res = app.clone().oneshot(req).await.expect("router is infallible");
    let status = res.status();
    let headers = res.headers().clone();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.expect("read body");
    TestResponse { status, headers, body }
}
