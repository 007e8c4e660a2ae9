//! recsync - CLI tool for exploring record stores.
//!
//! A thin wrapper over the `recsync` library for manual inspection of a
//! store: running queries, editing records, managing subscriptions and
//! checking account status.

mod cli;
mod commands;
mod output;
mod profile;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    commands::handle(cli.command).await
}

/// Default filter for a verbosity count.
///
/// Extra verbosity only raises the recsync crates; dependencies such as
/// reqwest stay at `warn` until `-vvv`. `RUST_LOG` overrides all of it.
fn log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,recsync=info",
        2 => "warn,recsync=debug",
        _ => "info,recsync=trace",
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(verbosity)));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Targets tell the store transport apart from the client once
        // debug output is on.
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(verbosity >= 2)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
