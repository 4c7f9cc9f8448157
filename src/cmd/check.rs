//! `edge-proxy check`: probe a running instance end to end.
//!
//! Requests each public health path through the proxy, so every probe
//! exercises routing, forwarding, and the upstream behind it. Reports one
//! line per upstream and fails if any probe does not return `2xx`.

use std::time::{Duration, Instant};

use console::style;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;

use crate::cli::CheckArgs;
use crate::error::EdgeError;

/// Health paths served through the proxy, one per upstream.
pub const PROBES: [(&str, &str); 4] = [
    ("catalog", "/api/v1/health"),
    ("auth", "/api/auth/health"),
    ("user", "/api/admin/health"),
    ("catalog (bare)", "/health"),
];

#[derive(Debug, Serialize)]
pub struct ProbeResult {
    pub upstream: &'static str,
    pub path: &'static str,
    pub status: Option<u16>,
    pub latency_ms: u64,
    pub correlation_id: Option<String>,
    pub error: Option<String>,
}

impl ProbeResult {
    #[must_use]
    pub fn healthy(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

pub async fn execute(args: CheckArgs) -> Result<(), EdgeError> {
    let base = args.url.trim_end_matches('/').to_string();
    let timeout = Duration::from_millis(args.timeout);

    let mut results = Vec::with_capacity(PROBES.len());
    for (upstream, path) in PROBES {
        results.push(probe(&base, upstream, path, timeout).await?);
    }

    let failed = results.iter().filter(|r| !r.healthy()).count();

    if args.json {
        println!(
            "{}",
            serde_json::json!({
                "url": base,
                "healthy": failed == 0,
                "probes": results,
            })
        );
    } else {
        println!("{}", format_results(&base, &results));
    }

    if failed > 0 {
        return Err(EdgeError::HealthCheckFailed {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}

async fn probe(
    base: &str,
    upstream: &'static str,
    path: &'static str,
    timeout: Duration,
) -> Result<ProbeResult, EdgeError> {
    let uri: hyper::Uri = format!("{base}{path}").parse().map_err(
        |e: hyper::http::uri::InvalidUri| EdgeError::UriParse {
            source: Box::new(e),
        },
    )?;

    let connector = hyper_util::client::legacy::connect::HttpConnector::new();
    let client = Client::builder(TokioExecutor::new()).build(connector);

    let req = hyper::Request::builder()
        .uri(uri)
        .body(Empty::<bytes::Bytes>::new())
        .map_err(|e| EdgeError::HttpRequest {
            source: Box::new(e),
        })?;

    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, client.request(req)).await;
    let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let result = match outcome {
        Ok(Ok(response)) => {
            let status = response.status().as_u16();
            let correlation_id = response
                .headers()
                .get("x-correlation-id")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            // Drain so the connection closes cleanly; the payload is not used
            let _ = response.into_body().collect().await;
            ProbeResult {
                upstream,
                path,
                status: Some(status),
                latency_ms,
                correlation_id,
                error: None,
            }
        }
        Ok(Err(e)) => ProbeResult {
            upstream,
            path,
            status: None,
            latency_ms,
            correlation_id: None,
            error: Some(e.to_string()),
        },
        Err(_) => ProbeResult {
            upstream,
            path,
            status: None,
            latency_ms,
            correlation_id: None,
            error: Some(format!("timed out after {}ms", timeout.as_millis())),
        },
    };
    Ok(result)
}

#[must_use]
pub fn format_results(base: &str, results: &[ProbeResult]) -> String {
    let mut lines = vec![format!("edge-proxy at {base}")];
    for r in results {
        let mark = if r.healthy() {
            style("\u{2713}").green()
        } else {
            style("\u{2717}").red()
        };
        let outcome = match (r.status, &r.error) {
            (Some(status), _) => status.to_string(),
            (None, Some(err)) => err.clone(),
            (None, None) => "no response".into(),
        };
        lines.push(format!(
            "  {mark} {:<15} {:<18} {outcome} ({}ms)",
            r.upstream, r.path, r.latency_ms
        ));
    }
    lines.join("\n")
}
