//! Configuration loading and validation.
//!
//! Configuration is resolved once at start-up and never changes for the
//! life of the process. Layers, lowest precedence first: an optional
//! config file, then environment variables / CLI flags. Submodules
//! provide the data model, validation logic, and file parsing.

pub mod model;
pub mod sources;
pub mod validation;

use std::path::PathBuf;

use crate::cli::ConfigArgs;
use crate::error::EdgeError;
use crate::proxy::routing::Service;
use model::Config;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Config file the base layer came from, if any.
    pub file: Option<PathBuf>,
}

impl LoadedConfig {
    #[must_use]
    pub fn source_name(&self) -> String {
        self.file
            .as_ref()
            .map_or_else(|| "environment".into(), |p| p.display().to_string())
    }
}

/// Overlay flag / environment values on top of a file-based config.
pub fn apply_overrides(config: &mut Config, args: &ConfigArgs) {
    for service in Service::ALL {
        if let Some(url) = args.upstream_url(service) {
            config.upstreams.set(service, url.to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        config.defaults.timeout = timeout;
    }
    if let Some(max_redirects) = args.max_redirects {
        config.defaults.max_redirects = max_redirects;
    }
}

/// Merge all layers without validating.
pub async fn resolve(args: &ConfigArgs) -> Result<LoadedConfig, EdgeError> {
    let file = match &args.config {
        Some(path) => Some(path.clone()),
        None => {
            let found = sources::find_config_file(&std::env::current_dir()?).await;
            if let Some(ref path) = found {
                tracing::info!(path = %path.display(), "auto-detected config file");
            }
            found
        }
    };

    let mut config = match &file {
        Some(path) => sources::read_config_file(path).await?,
        None => Config::default(),
    };
    apply_overrides(&mut config, args);

    Ok(LoadedConfig { config, file })
}

/// Merge all layers and validate the result.
pub async fn load(args: &ConfigArgs) -> Result<LoadedConfig, EdgeError> {
    let loaded = resolve(args).await?;
    validation::validate(&loaded.config).map_err(|errors| EdgeError::ConfigValidation { errors })?;
    Ok(loaded)
}
