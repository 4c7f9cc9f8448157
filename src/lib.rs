//! Edge router for the catalog, order, user, and auth services.
//!
//! Every inbound request is matched against a fixed, ordered table of
//! path rules, optionally has a legacy path alias rewritten, and is
//! forwarded to exactly one upstream with a fresh `x-correlation-id`.
//! Every response, proxied or local, carries the same CORS header set.
//! The process holds no state across requests.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, validate, routes, check).
//! - [`config`] -- Start-up configuration: file, environment, and flag layers.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`middleware`] -- CORS overlay and preflight short-circuit.
//! - [`proxy`] -- Core HTTP forwarding: route table, header construction,
//!   and the outbound call with redirect following.
//! - [`server`] -- Axum server setup, shared read-only state, HTTP client,
//!   and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |

// Binary crate: public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod proxy;
pub mod server;
