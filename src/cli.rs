//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, routes, check), and their associated
//! argument structs. Every flag has an environment variable equivalent
//! for container deployments; the four upstream URLs are normally
//! supplied only through the environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::proxy::routing::Service;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("EDGE_PROXY_GIT_SHORT"),
    " ",
    env!("EDGE_PROXY_GIT_BRANCH"),
    ", ",
    env!("EDGE_PROXY_BUILD_PROFILE"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "edge-proxy",
    version,
    long_version = LONG_VERSION,
    about = "Edge router for the auth, catalog, order and user services",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        export AUTH_SERVICE_URL=http://localhost:8081\n  \
        export CATALOG_SERVICE_URL=http://localhost:8082\n  \
        export ORDER_SERVICE_URL=http://localhost:8083\n  \
        export USER_SERVICE_URL=http://localhost:8084\n  \
        edge-proxy run                       Start on 0.0.0.0:3000\n  \
        edge-proxy routes                    Show the routing table"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Run(Box<RunArgs>),

    /// Validate the resolved configuration without starting
    Validate(ValidateArgs),

    /// Print the routing table in priority order
    Routes(RoutesArgs),

    /// Probe a running instance through its health paths
    Check(CheckArgs),
}

/// Configuration layers shared by every subcommand that needs upstreams.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    // -- Upstreams --
    /// Auth service base URL
    #[arg(long, env = "AUTH_SERVICE_URL", help_heading = "Upstreams")]
    pub auth_url: Option<String>,

    /// Catalog service base URL
    #[arg(long, env = "CATALOG_SERVICE_URL", help_heading = "Upstreams")]
    pub catalog_url: Option<String>,

    /// Order service base URL
    #[arg(long, env = "ORDER_SERVICE_URL", help_heading = "Upstreams")]
    pub order_url: Option<String>,

    /// User service base URL
    #[arg(long, env = "USER_SERVICE_URL", help_heading = "Upstreams")]
    pub user_url: Option<String>,

    // -- Tuning --
    /// Upstream timeout in milliseconds [config default: 30000]
    #[arg(long, env = "REQUEST_TIMEOUT_MS", help_heading = "Tuning")]
    pub timeout: Option<u64>,

    /// Maximum upstream redirects followed per request [config default: 20]
    #[arg(long, env = "MAX_REDIRECTS", help_heading = "Tuning")]
    pub max_redirects: Option<usize>,
}

impl ConfigArgs {
    #[must_use]
    pub fn upstream_url(&self, service: Service) -> Option<&str> {
        match service {
            Service::Auth => self.auth_url.as_deref(),
            Service::Catalog => self.catalog_url.as_deref(),
            Service::Order => self.order_url.as_deref(),
            Service::User => self.user_url.as_deref(),
        }
    }
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        edge-proxy run                                Upstreams from the environment\n  \
        edge-proxy run -c edge-proxy.yaml             Upstreams from a file\n  \
        edge-proxy run -p 8080 --pretty               Local dev mode")]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 10 * 1024 * 1024,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct RoutesArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct CheckArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Per-probe timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_upstream_flags() {
        let cli = Cli::try_parse_from([
            "edge-proxy",
            "run",
            "--auth-url",
            "http://auth:8081",
            "--timeout",
            "1000",
            "-p",
            "8080",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(
            args.config.upstream_url(Service::Auth),
            Some("http://auth:8081")
        );
        assert_eq!(args.config.timeout, Some(1000));
    }
}
