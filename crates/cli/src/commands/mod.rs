//! Command-line surface of the controller.
//!
//! Three subcommands: `run` (enumerate and dispatch), `generate-token`
//! (mint a repository-scoped token out of band), and `generate-config`
//! (render the Renovate config template for one installation).

pub mod generate_config;
pub mod generate_token;
pub mod run;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use renovo_core::GitHubAppConfig;

/// GitHub App driven Renovate fleet controller for ECS.
#[derive(Parser, Debug)]
#[command(name = "renovo", version)]
#[command(about = "Runs one Renovate task per GitHub App installation repository on ECS")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch one Renovate task per reachable repository.
    Run(run::RunArgs),
    /// Mint a repository-scoped installation token.
    GenerateToken(generate_token::GenerateTokenArgs),
    /// Render the Renovate config template for one installation.
    GenerateConfig(generate_config::GenerateConfigArgs),
}

/// GitHub App identity flags shared by the subcommands that read the
/// private key from Secrets Manager.
#[derive(Args, Debug)]
pub struct AppArgs {
    /// GitHub App application ID.
    #[arg(short = 'a', long = "app-id", env = "GITHUB_APPLICATION_ID")]
    pub app_id: String,

    /// Secrets Manager secret holding the App private key PEM.
    #[arg(
        short = 's',
        long = "pem-aws-secret",
        env = "GITHUB_APPLICATION_PRIVATE_PEM_AWS_SECRET"
    )]
    pub pem_aws_secret: String,

    /// GitHub Enterprise Server host; empty selects the public API.
    #[arg(
        short = 'e',
        long = "endpoint",
        env = "GITHUB_APPLICATION_ENDPOINT",
        default_value = ""
    )]
    pub endpoint: String,
}

impl AppArgs {
    /// Retrieve the private key and assemble the app configuration.
    pub async fn resolve(&self) -> anyhow::Result<GitHubAppConfig> {
        let private_key_pem = renovo_aws::secrets::get_secret(&self.pem_aws_secret)
            .await
            .context("retrieving GitHub App private key")?;
        Ok(GitHubAppConfig {
            application_id: self.app_id.clone(),
            private_key_pem,
            endpoint: self.endpoint.clone(),
        })
    }
}

/// Route a parsed invocation to its command implementation.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => run::run(args).await,
        Command::GenerateToken(args) => generate_token::run(args).await,
        Command::GenerateConfig(args) => generate_config::run(args).await,
    }
}
