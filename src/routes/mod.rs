//! Router assembly: student and common routes behind the cross-origin and trace layers.

mod common;
mod student;

pub use common::common_routes;
pub use student::student_routes;

use crate::config::CorsConfig;
use crate::error::ConfigError;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Request bodies above this size are refused before reaching a handler.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Allowed methods GET, POST, PUT, DELETE, OPTIONS; allowed header
/// `Content-Type`. Any OPTIONS request is answered by the layer itself.
pub fn cors_layer(cfg: &CorsConfig) -> Result<CorsLayer, ConfigError> {
    if cfg.allow_credentials && cfg.allows_any_origin() {
        return Err(ConfigError::WildcardWithCredentials);
    }
    let origin = if cfg.allows_any_origin() {
        AllowOrigin::any()
    } else {
        let origins = cfg
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidValue {
                    key: "CORS_ALLOWED_ORIGINS",
                    value: o.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(origins)
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(cfg.allow_credentials))
}

pub fn app(state: AppState, cors: &CorsConfig) -> Result<Router, ConfigError> {
    Ok(Router::new()
        .merge(common_routes(state.clone()))
        .merge(student_routes(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors_layer(cors)?)
        .layer(TraceLayer::new_for_http()))
}
