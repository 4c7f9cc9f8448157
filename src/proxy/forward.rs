//! Outbound call to the resolved upstream.
//!
//! Sends one request through the shared pooled client and follows
//! upstream redirects the way a browser `fetch` would, so callers only
//! ever see the final response. The whole chain up to the final response
//! headers is bounded by the configured timeout. Nothing is retried.
//!
//! Request bodies are streamed and therefore cannot be replayed: a
//! redirect that would need to resend a body is relayed to the caller
//! unchanged instead.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, Response, StatusCode, Uri};
use hyper::body::Incoming;

use super::headers::host_header;
use super::routing::Service;
use crate::error::ProxyError;
use crate::server::HttpClient;

#[derive(Debug, Clone, Copy)]
pub struct ForwardSettings {
    pub timeout: Duration,
    pub max_redirects: usize,
}

#[derive(Debug)]
pub struct Outbound {
    pub service: Service,
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// `None` when nothing is sent (`GET`, `HEAD`, or an empty body).
    pub body: Option<Body>,
}

/// Build the outbound URI from the upstream origin, the (possibly
/// rewritten) path, and the untouched inbound query string.
pub fn outbound_uri(
    upstream: &url::Url,
    path: &str,
    query: Option<&str>,
) -> Result<Uri, ProxyError> {
    if !path.starts_with('/') {
        return Err(ProxyError::MalformedInbound(format!(
            "path '{path}' is not absolute"
        )));
    }
    let authority = host_header(upstream)
        .and_then(|v| v.to_str().ok().map(str::to_string))
        .ok_or_else(|| ProxyError::MalformedInbound("upstream has no host".into()))?;
    let path_and_query = match query {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    };

    Uri::builder()
        .scheme(upstream.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ProxyError::MalformedInbound(e.to_string()))
}

pub async fn forward(
    client: &HttpClient,
    outbound: Outbound,
    settings: ForwardSettings,
) -> Result<Response<Incoming>, ProxyError> {
    let service = outbound.service;
    match tokio::time::timeout(
        settings.timeout,
        follow_redirects(client, outbound, settings.max_redirects),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ProxyError::UpstreamTimeout {
            service,
            timeout_ms: u64::try_from(settings.timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

async fn follow_redirects(
    client: &HttpClient,
    mut outbound: Outbound,
    max_redirects: usize,
) -> Result<Response<Incoming>, ProxyError> {
    let service = outbound.service;
    let mut redirects = 0;

    loop {
        let body = outbound.body.take();
        let had_body = body.is_some();

        let mut request = Request::builder()
            .method(outbound.method.clone())
            .uri(outbound.uri.clone())
            .body(body.unwrap_or_else(Body::empty))
            .map_err(|e| ProxyError::MalformedInbound(e.to_string()))?;
        *request.headers_mut() = outbound.headers.clone();

        let response = client
            .request(request)
            .await
            .map_err(|e| ProxyError::UpstreamUnreachable {
                service,
                source: Box::new(e),
            })?;

        let status = response.status();
        let RedirectAction::Follow(method) = redirect_action(status, &outbound.method, had_body)
        else {
            return Ok(response);
        };
        let Some(next) = next_location(&outbound.uri, response.headers()) else {
            return Ok(response);
        };

        if redirects >= max_redirects {
            return Err(ProxyError::UpstreamUnreachable {
                service,
                source: format!("more than {max_redirects} redirects").into(),
            });
        }
        redirects += 1;

        tracing::debug!(
            upstream = %service,
            status = status.as_u16(),
            location = %next,
            "following upstream redirect"
        );

        if method != outbound.method {
            for name in [
                header::CONTENT_TYPE,
                header::CONTENT_LENGTH,
                header::CONTENT_ENCODING,
                header::CONTENT_LANGUAGE,
                header::CONTENT_LOCATION,
            ] {
                outbound.headers.remove(name);
            }
        }
        if next.scheme() != outbound.uri.scheme() || next.authority() != outbound.uri.authority()
        {
            outbound.headers.remove(header::AUTHORIZATION);
        }
        if let Some(host) = next.host() {
            let value = next
                .port_u16()
                .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
            if let Ok(value) = value.parse() {
                outbound.headers.insert(header::HOST, value);
            }
        }

        outbound.method = method;
        outbound.uri = next;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectAction {
    Follow(Method),
    Relay,
}

/// Decide whether a `3xx` is followed, and with which method.
#[must_use]
pub fn redirect_action(status: StatusCode, method: &Method, had_body: bool) -> RedirectAction {
    match status {
        StatusCode::SEE_OTHER if *method == Method::HEAD => RedirectAction::Follow(Method::HEAD),
        StatusCode::SEE_OTHER => RedirectAction::Follow(Method::GET),
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND if *method == Method::POST => {
            RedirectAction::Follow(Method::GET)
        }
        StatusCode::MOVED_PERMANENTLY
        | StatusCode::FOUND
        | StatusCode::TEMPORARY_REDIRECT
        | StatusCode::PERMANENT_REDIRECT
            if !had_body =>
        {
            RedirectAction::Follow(method.clone())
        }
        _ => RedirectAction::Relay,
    }
}

/// Resolve `Location` against the current URI. `None` when the header is
/// missing, unparseable, or points at a non-HTTP scheme.
#[must_use]
pub fn next_location(current: &Uri, headers: &HeaderMap) -> Option<Uri> {
    let location = headers.get(header::LOCATION)?.to_str().ok()?;
    let base = url::Url::parse(&current.to_string()).ok()?;
    let mut next = base.join(location).ok()?;
    if next.scheme() != "http" && next.scheme() != "https" {
        return None;
    }
    next.set_fragment(None);
    next.as_str().parse().ok()
}
