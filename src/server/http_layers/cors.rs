//! CORS response headers

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::IntoResponse,
};
use tracing::warn;

const ALLOWED_METHODS: &str = "POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Adds the CORS headers to every response, including errors and preflights.
pub async fn cors_headers(
    State(allowed_origin): State<String>,
    request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let response = next.run(request).await.into_response();

    let (mut parts, body) = response.into_parts();
    match HeaderValue::from_str(&allowed_origin) {
        Ok(origin) => {
            parts
                .headers
                .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        }
        Err(_) => warn!(origin = %allowed_origin, "Allowed origin is not a valid header value"),
    }
    parts.headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    parts.headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );

    axum::http::Response::from_parts(parts, body)
}
