// src/app.rs
//! Router composition

use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::common::SharedState;
use crate::logging_middleware;

/// The full application: routes, shared state and layers
pub fn build_app(shared: SharedState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true);

    Router::new()
        .merge(auth::auth_routes())
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
