//! Structured logging setup using the `tracing` ecosystem.
//!
//! JSON output when stdout is not a terminal (containers, log shippers),
//! pretty output on a TTY; `--json` / `--pretty` override detection.
//! Connection-level chatter from the HTTP and TLS stacks is held at
//! `warn` unless the proxy itself runs at `trace`, so per-request lines
//! (`correlation_id`, `upstream`, `status`, `latency_ms`) stay readable.

use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

/// Dependency targets that log per connection or per TLS record.
const NOISY_TARGETS: [&str; 4] = ["hyper", "hyper_util", "rustls", "h2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[must_use]
pub fn filter(level: &LogLevel) -> Targets {
    let level = level.to_tracing_level();
    let dependency_level = if level == Level::TRACE {
        Level::TRACE
    } else {
        level.min(Level::WARN)
    };

    NOISY_TARGETS
        .iter()
        .fold(Targets::new().with_default(level), |targets, target| {
            targets.with_target(*target, dependency_level)
        })
}

pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = filter(level);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins() {
        assert_eq!(resolve_format(false, true), LogFormat::Json);
    }

    #[test]
    fn pretty_flag_forces_pretty() {
        assert_eq!(resolve_format(true, false), LogFormat::Pretty);
    }

    #[test]
    fn debug_keeps_client_stack_quiet() {
        let targets = filter(&LogLevel::Debug);
        assert!(targets.would_enable("edge_proxy::proxy", &Level::DEBUG));
        assert!(!targets.would_enable("hyper_util::client::legacy::pool", &Level::DEBUG));
        assert!(targets.would_enable("hyper_util::client::legacy::pool", &Level::WARN));
    }

    #[test]
    fn error_level_is_not_raised_for_dependencies() {
        let targets = filter(&LogLevel::Error);
        assert!(!targets.would_enable("rustls::conn", &Level::WARN));
        assert!(targets.would_enable("rustls::conn", &Level::ERROR));
    }

    #[test]
    fn trace_enables_everything() {
        let targets = filter(&LogLevel::Trace);
        assert!(targets.would_enable("h2::codec", &Level::TRACE));
    }
}
