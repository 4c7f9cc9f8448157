//! `edge-proxy run`: start the proxy server.
//!
//! Resolves and validates configuration once, builds the immutable
//! [`AppState`], and serves until SIGTERM / Ctrl+C with graceful
//! shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config;
use crate::error::EdgeError;
use crate::logging;
use crate::proxy::routing::Service;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), EdgeError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(&args.log_level, log_format);

    let loaded = config::load(&args.config).await?;
    let state = Arc::new(AppState::from_config(&loaded.config)?);

    for service in Service::ALL {
        tracing::info!(
            upstream = %service,
            origin = %state.upstreams.get(service),
            "upstream configured"
        );
    }

    let router = server::build_router(Arc::clone(&state), args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        config = %loaded.source_name(),
        routes = state.routes.rules().len(),
        timeout_ms = loaded.config.defaults.timeout,
        git = env!("EDGE_PROXY_GIT_SHORT"),
        "edge-proxy started"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(server::shutdown_signal())
    .await?;

    tracing::info!("edge-proxy stopped");
    Ok(())
}
