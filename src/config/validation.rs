//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a resolved [`Config`] for missing or
//! malformed upstream origins and out-of-range tuning values. All
//! problems are collected and returned together as [`ValidationError`]
//! values with per-field suggestions.

use url::Url;

use super::model::Config;
use crate::error::ValidationError;
use crate::proxy::routing::Service;

/// Parse one upstream base URL. Returns the parsed URL or a
/// human-readable error.
pub fn parse_upstream_url(raw: &str) -> Result<Url, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("is not set".into());
    }
    if !raw.contains("://") {
        return Err(format!("'{raw}' has no scheme"));
    }

    let parsed = Url::parse(raw).map_err(|_| format!("'{raw}' is not a valid URL"))?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(format!("'{raw}' has no host"));
    }
    if parsed.path() != "/" {
        return Err(format!(
            "'{raw}' must be an origin without a path (found '{}')",
            parsed.path()
        ));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(format!("'{raw}' must not carry a query or fragment"));
    }
    Ok(parsed)
}

fn suggestion_for(service: Service, raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        None | Some("") => Some(format!(
            "set {} or upstreams.{service} in the config file",
            service.env_var()
        )),
        Some(raw) if !raw.contains("://") => Some(format!("did you mean 'https://{raw}'?")),
        Some(raw) => Url::parse(raw)
            .ok()
            .filter(|u| u.path() != "/")
            .map(|mut u| {
                u.set_path("");
                u.set_query(None);
                u.set_fragment(None);
                format!("did you mean '{}'?", u.as_str().trim_end_matches('/'))
            }),
    }
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for service in Service::ALL {
        let raw = config.upstreams.get(service);
        if let Err(message) = parse_upstream_url(raw.unwrap_or_default()) {
            errors.push(ValidationError {
                field: format!("upstreams.{service}"),
                message,
                suggestion: suggestion_for(service, raw),
            });
        }
    }

    if config.defaults.timeout == 0 {
        errors.push(ValidationError {
            field: "defaults.timeout".into(),
            message: "timeout must be greater than 0".into(),
            suggestion: Some("the default is 30000 (ms)".into()),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
