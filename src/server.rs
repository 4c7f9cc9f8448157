//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared, read-only state holding the
//! route table, upstream origins, and HTTP client), [`build_router`] for
//! constructing the Axum router with middleware layers,
//! [`build_http_client`] for the connection-pooled hyper client, and
//! [`shutdown_signal`] for SIGTERM / Ctrl+C handling.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::config::model::Config;
use crate::config::validation::parse_upstream_url;
use crate::error::{EdgeError, ValidationError};
use crate::middleware::cors::cors_middleware;
use crate::proxy;
use crate::proxy::forward::ForwardSettings;
use crate::proxy::routing::{RouteTable, Service};

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Body>;

/// Parsed base URL of every backend service.
#[derive(Debug, Clone)]
pub struct Upstreams {
    pub auth: url::Url,
    pub catalog: url::Url,
    pub order: url::Url,
    pub user: url::Url,
}

impl Upstreams {
    #[must_use]
    pub const fn get(&self, service: Service) -> &url::Url {
        match service {
            Service::Auth => &self.auth,
            Service::Catalog => &self.catalog,
            Service::Order => &self.order,
            Service::User => &self.user,
        }
    }

    /// Parse the configured upstream strings. Expects a config that has
    /// already passed validation; reports every bad URL otherwise.
    pub fn from_config(config: &Config) -> Result<Self, EdgeError> {
        let mut errors = Vec::new();
        let mut parse = |service: Service| {
            let raw = config.upstreams.get(service).unwrap_or_default();
            parse_upstream_url(raw)
                .map_err(|message| {
                    errors.push(ValidationError {
                        field: format!("upstreams.{service}"),
                        message,
                        suggestion: None,
                    });
                })
                .ok()
        };

        let (auth, catalog, order, user) = (
            parse(Service::Auth),
            parse(Service::Catalog),
            parse(Service::Order),
            parse(Service::User),
        );

        match (auth, catalog, order, user) {
            (Some(auth), Some(catalog), Some(order), Some(user)) => Ok(Self {
                auth,
                catalog,
                order,
                user,
            }),
            _ => Err(EdgeError::ConfigValidation { errors }),
        }
    }
}

pub struct AppState {
    pub routes: RouteTable,
    pub upstreams: Upstreams,
    pub http_client: HttpClient,
    pub forward: ForwardSettings,
    pub proxy_headers: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, EdgeError> {
        Self::with_routes(config, RouteTable::standard())
    }

    /// Build state around `routes`, refusing a table where an earlier rule
    /// always wins over a later one.
    pub fn with_routes(config: &Config, routes: RouteTable) -> Result<Self, EdgeError> {
        let shadowed = routes.shadowed_rules();
        if !shadowed.is_empty() {
            return Err(EdgeError::ShadowedRoutes {
                patterns: shadowed
                    .into_iter()
                    .map(|i| routes.rules()[i].matcher.pattern())
                    .collect(),
            });
        }

        Ok(Self {
            routes,
            upstreams: Upstreams::from_config(config)?,
            http_client: build_http_client(),
            forward: ForwardSettings {
                timeout: Duration::from_millis(config.defaults.timeout),
                max_redirects: config.defaults.max_redirects,
            },
            proxy_headers: config.defaults.proxy_headers,
        })
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring`.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

pub fn build_router(state: Arc<AppState>, max_body: usize) -> Router {
    Router::new()
        .fallback(proxy::forward_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(cors_middleware))
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
