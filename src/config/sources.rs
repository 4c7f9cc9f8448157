//! Config file discovery and format-specific parsing.
//!
//! File formats are gated by feature flags (`yaml` by default, `json`,
//! `toml`). [`find_config_file`] auto-detects a config file in the
//! working directory when none is given explicitly.

use std::path::{Path, PathBuf};

use crate::config::model::Config;
use crate::error::EdgeError;

pub const CANDIDATES: [&str; 4] = [
    "edge-proxy.yaml",
    "edge-proxy.yml",
    "edge-proxy.json",
    "edge-proxy.toml",
];

/// Parse a config string based on file extension.
pub fn parse_config_str(ext: &str, content: &str, path_display: &str) -> Result<Config, EdgeError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| EdgeError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| EdgeError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| EdgeError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(EdgeError::UnsupportedFormat(other.to_string())),
    }
}

pub async fn read_config_file(path: &Path) -> Result<Config, EdgeError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EdgeError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            EdgeError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_config_str(ext, &content, &path.display().to_string())
}

/// First existing candidate file in `dir`.
pub async fn find_config_file(dir: &Path) -> Option<PathBuf> {
    for name in &CANDIDATES {
        let path = dir.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "yaml")]
    #[test]
    fn parses_yaml() {
        let yaml = r#"
upstreams:
  auth: "http://auth:8081"
  catalog: "http://catalog:8082"
defaults:
  timeout: 1500
"#;
        let config = parse_config_str("yaml", yaml, "edge-proxy.yaml").unwrap();
        assert_eq!(config.upstreams.auth.as_deref(), Some("http://auth:8081"));
        assert!(config.upstreams.order.is_none());
        assert_eq!(config.defaults.timeout, 1500);
        assert_eq!(config.defaults.max_redirects, 20);
        assert!(config.defaults.proxy_headers);
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn rejects_unknown_fields() {
        let yaml = "routes: []\n";
        let err = parse_config_str("yml", yaml, "edge-proxy.yml").unwrap_err();
        assert!(matches!(err, EdgeError::ConfigParse { .. }));
    }

    #[cfg(feature = "json")]
    #[test]
    fn parses_json() {
        let json = r#"{"upstreams": {"user": "http://user:8084"}, "defaults": {"proxy_headers": false}}"#;
        let config = parse_config_str("json", json, "edge-proxy.json").unwrap();
        assert_eq!(config.upstreams.user.as_deref(), Some("http://user:8084"));
        assert!(!config.defaults.proxy_headers);
    }

    #[test]
    fn unsupported_format_returns_error() {
        let err = parse_config_str("xml", "<config/>", "edge-proxy.xml").unwrap_err();
        assert!(matches!(err, EdgeError::UnsupportedFormat(ref f) if f == "xml"));
    }
}
