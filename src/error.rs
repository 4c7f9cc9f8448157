//! Unified error types for the edge proxy.
//!
//! [`EdgeError`] covers process-level failures (config loading, start-up,
//! the `check` command). [`ProxyError`] is the per-request taxonomy; it
//! renders as a status code plus a terse plain-text body and never leaks
//! internal details to the caller. [`ValidationError`] describes one
//! config problem with an optional hint.

use std::path::PathBuf;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::proxy::routing::Service;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EdgeError {
    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{failed} of {total} health probes failed")]
    HealthCheckFailed { failed: usize, total: usize },

    #[error("Route table misordered, these rules can never match: {}", patterns.join(", "))]
    ShadowedRoutes { patterns: Vec<&'static str> },
}

/// Failure while routing or forwarding a single request.
///
/// Upstream responses with error statuses are not represented here: they
/// are relayed to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("no route matches {path}")]
    NoRouteMatch { path: String },

    #[error("{service} upstream unreachable: {source}")]
    UpstreamUnreachable {
        service: Service,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{service} upstream did not respond within {timeout_ms}ms")]
    UpstreamTimeout { service: Service, timeout_ms: u64 },

    #[error("malformed request: {0}")]
    MalformedInbound(String),
}

impl ProxyError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            Self::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::MalformedInbound(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn body(&self) -> &'static str {
        match self {
            Self::NoRouteMatch { .. } => "Not Found",
            Self::UpstreamUnreachable { .. } => "Bad Gateway",
            Self::UpstreamTimeout { .. } => "Gateway Timeout",
            Self::MalformedInbound(_) => "Bad Request",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )],
            self.body(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_errors_map_to_gateway_statuses() {
        let unreachable = ProxyError::UpstreamUnreachable {
            service: Service::Catalog,
            source: "connection refused".into(),
        };
        assert_eq!(unreachable.status(), StatusCode::BAD_GATEWAY);

        let timeout = ProxyError::UpstreamTimeout {
            service: Service::Order,
            timeout_ms: 100,
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let missing = ProxyError::NoRouteMatch {
            path: "/foo".into(),
        };
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ProxyError::MalformedInbound("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn response_body_hides_internal_details() {
        let err = ProxyError::UpstreamUnreachable {
            service: Service::User,
            source: "dns error: failed to lookup address user.internal".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            field: "upstreams.auth".into(),
            message: "missing scheme".into(),
            suggestion: Some("did you mean 'https://auth'?".into()),
        };
        assert_eq!(
            err.to_string(),
            "  upstreams.auth: missing scheme (did you mean 'https://auth'?)"
        );
    }
}
