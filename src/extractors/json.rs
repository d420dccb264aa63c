//! Strict JSON body extractor: every decoding failure is a 400 with the serde message;
//! a body over the router's limit is a 413.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;

/// Like `axum::Json`, but does not require a `Content-Type` header and maps
/// every rejection (missing body, syntax, type mismatch, unknown field) to
/// `AppError::BadRequest`, except an over-limit body, which stays 413.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| {
                if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(e.body_text())
                } else {
                    AppError::BadRequest(e.body_text())
                }
            })?;
        let value = serde_json::from_slice(&bytes).map_err(|e| AppError::BadRequest(format!("invalid body: {}", e)))?;
        Ok(JsonBody(value))
    }
}
