//! # tinct - Theme Generator
//!
//! The main binary for tinct.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   apps/tinct (THE BINARY)                │
//! │                                                          │
//! │  ┌─────────────┐    ┌──────────────┐    ┌────────────┐   │
//! │  │    CLI      │    │ Theme files  │    │   Units    │   │
//! │  │   (clap)    │    │ (toml/serde) │    │ vim/json/  │   │
//! │  └──────┬──────┘    └──────┬───────┘    │ file/stdout│   │
//! │         │                  │            └─────┬──────┘   │
//! │         └──────────────────┼──────────────────┘          │
//! │                            ▼                             │
//! │                    ┌───────────────┐                     │
//! │                    │  tinct-core   │                     │
//! │                    │  (THE LOGIC)  │                     │
//! │                    └───────────────┘                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! tinct build --theme dusk.toml --out dist
//! tinct build --theme base.toml --theme dusk.toml --format vim --stdout
//! tinct check --strict
//! tinct resolve @comment
//! ```

use clap::Parser;
use tinct::cli;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Logs go to stderr; stdout carries command output.
    // TINCT_LOG_FORMAT=json enables machine-parseable logs.
    let log_format = std::env::var("TINCT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose { "tinct=debug" } else { "tinct=info" };
    let filter = EnvFilter::try_from_env("TINCT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
