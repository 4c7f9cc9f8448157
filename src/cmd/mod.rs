//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], [`routes`], or [`check`].
//! Each handler lives in its own submodule.

pub mod check;
pub mod routes;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::EdgeError;

pub async fn dispatch(cli: Cli) -> Result<(), EdgeError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args).await,
        Some(Commands::Routes(ref args)) => routes::execute(args).await,
        Some(Commands::Check(args)) => check::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  edge-proxy v{version} - edge router for the backend services\n\n  \
         No command provided. To get started:\n\n    \
         edge-proxy run                    Start the proxy (upstreams from *_SERVICE_URL)\n    \
         edge-proxy validate               Check the upstream configuration\n    \
         edge-proxy routes                 Show which path goes where\n    \
         edge-proxy --help                 See all commands and options\n"
    );
}
