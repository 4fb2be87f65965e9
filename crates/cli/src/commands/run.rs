//! `renovo run` -- enumerate every installation repository and launch
//! one Renovate task per repository.

use anyhow::Context;
use async_trait::async_trait;
use clap::Args;

use renovo_aws::{DispatchConfig, TaskDispatcher, TaskIdentity, TaskLauncher};
use renovo_core::CredentialMode;
use renovo_github::enumerate::{self, RepositoryVisitor};
use renovo_github::{GitHubClient, Installation, Repository};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub app: super::AppArgs,

    /// ECS cluster name.
    #[arg(short = 'c', long, env = "AWS_ECS_CLUSTER_NAME")]
    pub cluster: String,

    /// Task definition family or ARN.
    #[arg(short = 't', long, env = "AWS_ECS_CLUSTER_TASK")]
    pub task: String,

    /// Container whose environment receives the repository parameters.
    #[arg(
        long = "container-name",
        env = "AWS_ECS_CLUSTER_TASK_CONTAINER_NAME",
        default_value = "renovate"
    )]
    pub container_name: String,

    /// Comma-separated subnet IDs; discovered by tag when omitted.
    #[arg(long = "subnet-ids", env = "AWS_ECS_TASK_SUBNET_IDS")]
    pub subnet_ids: Option<String>,

    /// Comma-separated security group IDs; discovered by tag when omitted.
    #[arg(long = "security-group-ids", env = "AWS_ECS_TASK_SECURITY_GROUP_IDS")]
    pub security_group_ids: Option<String>,

    /// Assign a public IP to each task.
    #[arg(long = "assign-public-ip", env = "AWS_ECS_TASK_PUBLIC_IP")]
    pub assign_public_ip: bool,

    /// Credential material handed to each task: installation-token,
    /// repository-token, or identity.
    #[arg(
        long = "credential-mode",
        env = "RENOVO_CREDENTIAL_MODE",
        default_value = "installation-token"
    )]
    pub credential_mode: CredentialMode,
}

/// Split a comma-separated flag value, dropping empty segments.
///
/// `None` means the flag was omitted entirely (discovery applies);
/// `Some("")` is an intentionally empty explicit list.
fn split_ids(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    })
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let app_config = args.app.resolve().await?;
    let app = enumerate::app_client(&app_config).context("building app client")?;

    let dispatcher = TaskDispatcher::new(DispatchConfig {
        cluster: args.cluster,
        task_definition: args.task,
        container: args.container_name,
        assign_public_ip: args.assign_public_ip,
        subnets: split_ids(args.subnet_ids.as_deref()),
        security_groups: split_ids(args.security_group_ids.as_deref()),
    })
    .await;

    let mut visitor = DispatchVisitor::new(
        dispatcher,
        args.credential_mode,
        app.clone(),
        app_config.application_id.clone(),
        args.app.pem_aws_secret.clone(),
    );

    enumerate::visit_all_repositories(&app, &mut visitor)
        .await
        .context("enumerating installation repositories")?;

    tracing::info!(
        launched = visitor.launched,
        failed = visitor.failed,
        "Dispatch run complete",
    );
    Ok(())
}

/// Visitor that launches one task per enumerated repository.
///
/// Launch failures are contained: they are logged and counted, and the
/// enumeration moves on to the next repository. This is the only place
/// in the controller where a failure is deliberately not propagated.
pub struct DispatchVisitor<L> {
    launcher: L,
    mode: CredentialMode,
    app: GitHubClient,
    application_id: String,
    pem_secret_arn: String,
    /// Successful launches so far.
    pub launched: usize,
    /// Contained per-repository failures so far.
    pub failed: usize,
}

impl<L: TaskLauncher> DispatchVisitor<L> {
    pub fn new(
        launcher: L,
        mode: CredentialMode,
        app: GitHubClient,
        application_id: String,
        pem_secret_arn: String,
    ) -> Self {
        Self {
            launcher,
            mode,
            app,
            application_id,
            pem_secret_arn,
            launched: 0,
            failed: 0,
        }
    }

    /// The launcher this visitor dispatches through.
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    async fn dispatch(
        &self,
        installation: &Installation,
        repository: &Repository,
        installation_token: &str,
        endpoint: &str,
    ) -> anyhow::Result<String> {
        match self.mode {
            CredentialMode::InstallationToken => Ok(self
                .launcher
                .launch_with_token(installation_token, &repository.full_name, endpoint)
                .await?),
            CredentialMode::RepositoryToken => {
                // Narrow the credential to this one repository before it
                // leaves the controller.
                let scoped = self
                    .app
                    .create_installation_token(installation.id, Some(&[repository.name.clone()]))
                    .await
                    .context("minting repository-scoped token")?;
                Ok(self
                    .launcher
                    .launch_with_token(&scoped.token, &repository.full_name, endpoint)
                    .await?)
            }
            CredentialMode::Identity => {
                let identity = TaskIdentity {
                    application_id: self.application_id.clone(),
                    installation_id: installation.id,
                    repository: repository.full_name.clone(),
                    pem_secret_arn: self.pem_secret_arn.clone(),
                };
                Ok(self.launcher.launch_with_identity(&identity).await?)
            }
        }
    }
}

#[async_trait]
impl<L: TaskLauncher> RepositoryVisitor for DispatchVisitor<L> {
    async fn visit_repository(
        &mut self,
        installation: &Installation,
        repository: &Repository,
        installation_token: &str,
        endpoint: &str,
    ) {
        tracing::info!(repository = %repository.full_name, "Creating renovate task");
        match self
            .dispatch(installation, repository, installation_token, endpoint)
            .await
        {
            Ok(task_arn) => {
                self.launched += 1;
                tracing::debug!(repository = %repository.full_name, task_arn = %task_arn, "Task launched");
            }
            Err(err) => {
                self.failed += 1;
                let reason = format!("{err:#}");
                tracing::warn!(
                    repository = %repository.full_name,
                    error = %reason,
                    "Task dispatch failed; continuing with remaining repositories",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ids_distinguishes_omitted_from_empty() {
        assert_eq!(split_ids(None), None);
        assert_eq!(split_ids(Some("")), Some(Vec::new()));
        assert_eq!(
            split_ids(Some("subnet-a, subnet-b")),
            Some(vec!["subnet-a".to_string(), "subnet-b".to_string()]),
        );
    }
}
