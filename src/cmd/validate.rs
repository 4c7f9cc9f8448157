//! `edge-proxy validate`: check the resolved configuration for errors.
//!
//! Merges the config file, environment, and flags exactly as `run` would,
//! validates the result, and reports in human-readable text or
//! machine-readable JSON.

use console::style;

use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::{self, validation, LoadedConfig};
use crate::error::EdgeError;
use crate::proxy::routing::Service;

pub async fn execute(args: &ValidateArgs) -> Result<(), EdgeError> {
    let loaded = config::resolve(&args.config).await?;
    let source = loaded.source_name();

    if let Err(errors) = validation::validate(&loaded.config) {
        match args.format {
            OutputFormat::Text => {
                eprintln!(
                    "{} configuration from {source} has {} errors\n",
                    style("\u{2717}").red().bold(),
                    errors.len()
                );
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            OutputFormat::Json => {
                let json_errors: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "field": e.field,
                            "message": e.message,
                            "suggestion": e.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "source": source,
                        "errors": json_errors,
                    })
                );
            }
        }
        return Err(EdgeError::ConfigValidation { errors });
    }

    match args.format {
        OutputFormat::Text => {
            println!("{} {}", style("\u{2713}").green().bold(), format_report(&loaded));
        }
        OutputFormat::Json => {
            let upstreams: serde_json::Map<String, serde_json::Value> = Service::ALL
                .iter()
                .map(|s| {
                    (
                        s.to_string(),
                        serde_json::json!(loaded.config.upstreams.get(*s)),
                    )
                })
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "source": source,
                    "upstreams": upstreams,
                    "timeout_ms": loaded.config.defaults.timeout,
                    "max_redirects": loaded.config.defaults.max_redirects,
                })
            );
        }
    }

    Ok(())
}

#[must_use]
pub fn format_report(loaded: &LoadedConfig) -> String {
    let config = &loaded.config;
    let mut lines = vec![format!("configuration from {} is valid\n", loaded.source_name())];

    for service in Service::ALL {
        lines.push(format!(
            "  {:<8} {}",
            service.as_str(),
            config.upstreams.get(service).unwrap_or("-")
        ));
    }
    lines.push(String::new());
    lines.push(format!("  timeout:        {}ms", config.defaults.timeout));
    lines.push(format!("  max redirects:  {}", config.defaults.max_redirects));
    lines.push(format!(
        "  proxy headers:  {}",
        if config.defaults.proxy_headers {
            "on"
        } else {
            "off"
        }
    ));

    lines.join("\n")
}
