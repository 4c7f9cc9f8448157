//! Core HTTP request forwarding handler.
//!
//! The [`forward_handler`] function is the Axum fallback that receives
//! every non-preflight request, resolves it against the route table, and
//! forwards it to exactly one upstream. Submodules handle route matching
//! ([`routing`]), header construction ([`headers`]), and the outbound call
//! with redirect following ([`forward`]).
//!
//! Dot segments are resolved before routing, so `/api/v1/../admin/users`
//! is routed (and forwarded) as `/api/admin/users`.
//!
//! Dropping the handler future (caller disconnected) drops the in-flight
//! client request with it, which cancels the upstream call.

pub mod forward;
pub mod headers;
pub mod routing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use hyper::body::Body as _;

use crate::error::ProxyError;
use crate::server::AppState;

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let correlation_id = headers::new_correlation_id();
    let (parts, body) = request.into_parts();
    let method = parts.method;
    let raw_path = parts.uri.path();

    let Some(normalized) = routing::normalize_path(raw_path) else {
        tracing::warn!(
            correlation_id = %correlation_id,
            method = %method,
            path = %raw_path,
            "rejected unparseable path"
        );
        return ProxyError::MalformedInbound(format!("path '{raw_path}' cannot be parsed"))
            .into_response();
    };
    let path = normalized.as_str();

    let Some(resolved) = state.routes.resolve(path) else {
        tracing::debug!(
            correlation_id = %correlation_id,
            method = %method,
            path = %path,
            "no route matched"
        );
        return ProxyError::NoRouteMatch {
            path: path.to_string(),
        }
        .into_response();
    };

    let service = resolved.service;
    let upstream = state.upstreams.get(service);

    let uri = match forward::outbound_uri(upstream, &resolved.path, parts.uri.query()) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                error = %e,
                "rejected malformed request"
            );
            return e.into_response();
        }
    };

    let mut forwarded_headers = headers::build_forwarded_headers(
        &parts.headers,
        &addr.ip().to_string(),
        // Plain-HTTP listener; an absolute-form request target may say otherwise
        parts.uri.scheme_str().unwrap_or("http"),
        upstream,
        state.proxy_headers,
        &correlation_id,
    );

    let body = if method == Method::GET || method == Method::HEAD || body.is_end_stream() {
        if method == Method::GET || method == Method::HEAD {
            forwarded_headers.remove(header::CONTENT_LENGTH);
        }
        None
    } else {
        Some(body)
    };

    tracing::debug!(
        correlation_id = %correlation_id,
        method = %method,
        path = %path,
        upstream = %service,
        forward_path = %resolved.path,
        "forwarding request"
    );

    let outbound = forward::Outbound {
        service,
        method: method.clone(),
        uri,
        headers: forwarded_headers,
        body,
    };

    let start = Instant::now();
    let result = forward::forward(&state.http_client, outbound, state.forward).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut response = match result {
        Ok(upstream_response) => {
            let (upstream_parts, upstream_body) = upstream_response.into_parts();
            tracing::info!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                upstream = %service,
                status = upstream_parts.status.as_u16(),
                latency_ms,
                "request forwarded"
            );

            let mut resp_headers = upstream_parts.headers;
            headers::strip_response_hop_by_hop(&mut resp_headers);
            let mut response = Response::new(Body::new(upstream_body));
            *response.status_mut() = upstream_parts.status;
            *response.headers_mut() = resp_headers;
            response
        }
        Err(e) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                method = %method,
                path = %path,
                upstream = %service,
                latency_ms,
                error = %e,
                "upstream request failed"
            );
            e.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response.headers_mut().insert(headers::CORRELATION_ID, value);
    }
    response
}
