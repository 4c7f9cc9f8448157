//! Header construction, forwarding, and hop-by-hop stripping.
//!
//! [`build_forwarded_headers`] clones the original client headers, strips
//! hop-by-hop headers, rewrites `Host` to the upstream authority, adds
//! proxy metadata (`X-Forwarded-For`, `X-Real-IP`, `X-Forwarded-Proto`,
//! `X-Forwarded-Host`) when enabled, and always stamps a fresh
//! `X-Correlation-Id`.

use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

pub const CORRELATION_ID: HeaderName = HeaderName::from_static("x-correlation-id");

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
        "proxy-connection",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

/// A fresh random (v4) identifier. Never derived from the inbound request.
#[must_use]
pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Strip hop-by-hop headers from an upstream response.
///
/// The body is streamed through unchanged, so `content-length` stays
/// accurate and is kept.
pub fn strip_response_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

#[must_use]
pub fn host_header(url: &url::Url) -> Option<HeaderValue> {
    let host = url.host_str()?;
    let value = url
        .port()
        .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
    HeaderValue::from_str(&value).ok()
}

pub fn build_forwarded_headers(
    original: &HeaderMap,
    client_ip: &str,
    inbound_scheme: &str,
    upstream: &url::Url,
    proxy_headers: bool,
    correlation_id: &str,
) -> HeaderMap {
    let mut headers = original.clone();

    for header_name in HOP_BY_HOP.iter() {
        headers.remove(header_name);
    }

    if let Some(host) = host_header(upstream) {
        headers.insert("host", host);
    }

    if proxy_headers {
        // X-Forwarded-For: append to chain
        let xff = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map_or_else(
                || client_ip.to_string(),
                |existing| format!("{existing}, {client_ip}"),
            );
        if let Ok(val) = HeaderValue::from_str(&xff) {
            headers.insert("x-forwarded-for", val);
        }

        // X-Real-IP (first IP in chain)
        let real_ip = xff.split(',').next().unwrap_or(client_ip).trim();
        if let Ok(val) = HeaderValue::from_str(real_ip) {
            headers.insert("x-real-ip", val);
        }

        // Keep a value set by a TLS-terminating hop in front of us
        if !headers.contains_key("x-forwarded-proto") {
            if let Ok(val) = HeaderValue::from_str(inbound_scheme) {
                headers.insert("x-forwarded-proto", val);
            }
        }

        if let Some(original_host) = original.get("host") {
            headers.insert("x-forwarded-host", original_host.clone());
        }
    }

    // Always overwritten: the caller never chooses the downstream id
    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_ID, val);
    }

    headers
}
