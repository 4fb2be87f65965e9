//! `renovo generate-config` -- render the Renovate config template for
//! one installation.
//!
//! The template lives in S3 and is rendered with the installation's
//! freshly minted token, the endpoint, the target repository, and the
//! full list of repository names visible to the installation.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use clap::Args;
use serde::Serialize;

use renovo_github::enumerate::{self, InstallationVisitor};

#[derive(Args, Debug)]
pub struct GenerateConfigArgs {
    #[command(flatten)]
    pub app: super::AppArgs,

    /// Installation to render the config for.
    #[arg(long = "installation-id", env = "GITHUB_INSTALLATION_ID")]
    pub installation_id: i64,

    /// Repository the rendered config targets.
    #[arg(
        long = "target-repository",
        env = "GITHUB_TARGET_REPOSITORY",
        default_value = ""
    )]
    pub target_repository: String,

    /// S3 bucket holding the config template.
    #[arg(long = "s3-bucket", env = "CONFIG_TEMPLATE_BUCKET")]
    pub s3_bucket: String,

    /// Object key of the config template.
    #[arg(long = "s3-config-key", env = "CONFIG_TEMPLATE_KEY")]
    pub s3_config_key: String,

    /// Output path for the rendered config.
    #[arg(
        short = 'o',
        long,
        env = "GENERATE_CONFIG_OUTPUT",
        default_value = "config.ts"
    )]
    pub output: PathBuf,
}

/// Values substituted into the config template.
#[derive(Debug, Serialize)]
pub struct TemplateData {
    #[serde(rename = "InstallationToken")]
    pub installation_token: String,
    #[serde(rename = "Endpoint")]
    pub endpoint: String,
    #[serde(rename = "Repository")]
    pub repository: String,
    #[serde(rename = "Repositories")]
    pub repositories: Vec<String>,
}

/// Render a Handlebars template with the values for one installation.
pub fn render_config(
    template: &str,
    data: &TemplateData,
) -> Result<String, handlebars::RenderError> {
    let registry = handlebars::Handlebars::new();
    registry.render_template(template, data)
}

/// Captures the single batch-visitor invocation so that all fallible
/// work (template fetch, render, write) happens outside the walk.
#[derive(Default)]
struct InstallationCapture {
    listing: Option<(Vec<String>, String, String)>,
}

#[async_trait]
impl InstallationVisitor for InstallationCapture {
    async fn visit_installation(
        &mut self,
        repositories: &[String],
        installation_token: &str,
        endpoint: &str,
    ) {
        self.listing = Some((
            repositories.to_vec(),
            installation_token.to_string(),
            endpoint.to_string(),
        ));
    }
}

pub async fn run(args: GenerateConfigArgs) -> anyhow::Result<()> {
    let app_config = args.app.resolve().await?;
    let app = enumerate::app_client(&app_config).context("building app client")?;

    let template = renovo_aws::store::get_s3_object(&args.s3_bucket, &args.s3_config_key)
        .await
        .context("fetching config template")?;

    let mut capture = InstallationCapture::default();
    enumerate::visit_installation_repositories(&app, args.installation_id, &mut capture)
        .await
        .context("listing installation repositories")?;
    let (repositories, installation_token, endpoint) = capture
        .listing
        .with_context(|| format!("installation {} yielded no listing", args.installation_id))?;

    let data = TemplateData {
        installation_token,
        endpoint,
        repository: args.target_repository,
        repositories,
    };
    let rendered = render_config(&template, &data).context("rendering config template")?;

    tokio::fs::write(&args.output, rendered)
        .await
        .with_context(|| format!("writing {}", args.output.display()))?;

    tracing::info!(output = %args.output.display(), "Config template rendered");
    Ok(())
}
