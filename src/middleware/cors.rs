//! CORS overlay for every response the proxy emits.
//!
//! Runs as the outermost application layer so proxied responses, local
//! errors (404, 400, 502, 504) and body-limit rejections all carry the
//! same header set. `OPTIONS` requests are answered here with `204` and
//! never reach the router.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

pub const ALLOW_METHODS: &str = "GET,POST,PUT,PATCH,DELETE,OPTIONS";
pub const ALLOW_HEADERS: &str = "Origin,Content-Type,Accept,Authorization,X-Correlation-Id";

/// Overwrite the CORS header set on `headers`.
///
/// The allowed origin echoes the request's `Origin`, or `*` when the
/// request carried none.
pub fn apply_cors_headers(headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
    let allow_origin = origin
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
}

#[must_use]
pub fn preflight_response(origin: Option<&HeaderValue>) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    apply_cors_headers(response.headers_mut(), origin);
    response
}

pub async fn cors_middleware(request: Request, next: Next) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();

    if request.method() == Method::OPTIONS {
        tracing::debug!(
            path = %request.uri().path(),
            origin = ?origin,
            "answered preflight"
        );
        return preflight_response(origin.as_ref());
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut(), origin.as_ref());
    response
}
