//! HTTP server assembly

use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::services::Services;

pub mod routes;

pub fn create_router(services: Services) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/api/trending", get(routes::trending))
        .route("/api/lyrics", get(routes::lyrics))
        .route("/test", get(routes::diagnostics))
        .layer(middleware::from_fn(permissive_cors))
        .with_state(services)
}

/// The API is consumed by browser frontends on other origins; every
/// endpoint is read-only, so a blanket allow is fine.
async fn permissive_cors(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
    response
}
