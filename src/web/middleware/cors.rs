//! CORS layer.

use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use super::maintenance::{BYPASS_HEADER, NOTICE_HEADER};

const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer.
///
/// Without configured origins any origin is allowed, without credentials.
/// Unparseable origins are skipped.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    let layer = CorsLayer::new()
        .allow_methods(METHODS)
        .expose_headers([HeaderName::from_static(NOTICE_HEADER)]);

    if parsed.is_empty() {
        return layer.allow_headers(Any).allow_origin(Any);
    }

    layer
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(BYPASS_HEADER),
        ])
        .allow_credentials(true)
        .allow_origin(parsed)
}
