//! `renovo generate-token` -- mint a repository-scoped installation
//! token out of band, reading the private key from a local file.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use renovo_core::GitHubAppConfig;
use renovo_github::enumerate;

#[derive(Args, Debug)]
pub struct GenerateTokenArgs {
    /// GitHub App application ID.
    #[arg(short = 'a', long = "app-id", env = "GITHUB_APPLICATION_ID")]
    pub app_id: String,

    /// Path to the App private key PEM file.
    #[arg(short = 'p', long = "pem")]
    pub pem: PathBuf,

    /// GitHub Enterprise Server host; empty selects the public API.
    #[arg(short = 'e', long, default_value = "")]
    pub endpoint: String,

    /// Repository owner.
    #[arg(short = 'o', long)]
    pub owner: String,

    /// Repository name.
    #[arg(short = 'r', long)]
    pub repository: String,
}

pub async fn run(args: GenerateTokenArgs) -> anyhow::Result<()> {
    let private_key_pem = tokio::fs::read_to_string(&args.pem)
        .await
        .with_context(|| format!("reading private key {}", args.pem.display()))?;

    let config = GitHubAppConfig {
        application_id: args.app_id,
        private_key_pem,
        endpoint: args.endpoint,
    };

    let token = enumerate::generate_repository_token(&config, &args.owner, &args.repository)
        .await
        .context("generating repository token")?;

    println!("Installation Token: {token}");
    Ok(())
}
