//! `renovo` -- GitHub App driven Renovate fleet controller for ECS.
//!
//! Authenticates as a GitHub App, enumerates every repository reachable
//! through each installation of the app, and launches one isolated
//! Renovate task per repository on ECS Fargate.
//!
//! Every flag can also be supplied through the environment variable
//! named in `--help`; a `.env` file in the working directory is loaded
//! first.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use renovo_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "renovo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(err) = commands::dispatch(cli).await {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
