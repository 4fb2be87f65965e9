//! ECS task dispatch: one isolated Fargate task per repository.
//!
//! Each dispatch resolves its network placement, builds a fresh launch
//! request with a single container-level environment override, and
//! submits it. Requests are never reused across repositories, and a
//! request never carries credential material from a different
//! repository's token.

use async_trait::async_trait;
use aws_sdk_ecs::error::DisplayErrorContext;
use aws_sdk_ecs::types::{
    ContainerOverride, KeyValuePair, LaunchType, NetworkConfiguration, TaskOverride,
};

use crate::network::{self, NetworkError};

/// Launch parameters shared by every dispatch of one run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Target ECS cluster name.
    pub cluster: String,
    /// Task definition family or ARN.
    pub task_definition: String,
    /// Name of the container whose environment is overridden.
    pub container: String,
    /// Request a public IP on the task's network interface.
    pub assign_public_ip: bool,
    /// Explicit subnet IDs; `None` discovers by the allow tag.
    pub subnets: Option<Vec<String>>,
    /// Explicit security group IDs; `None` discovers by tag.
    pub security_groups: Option<Vec<String>>,
}

/// Identity material handed to a task that mints its own token instead
/// of receiving a pre-minted one.
#[derive(Debug, Clone)]
pub struct TaskIdentity {
    pub application_id: String,
    pub installation_id: i64,
    pub repository: String,
    /// Secrets Manager reference to the app private key PEM.
    pub pem_secret_arn: String,
}

/// Errors from a single dispatch attempt.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No subnet to place the task in; nothing was launched.
    #[error("no subnets available for task placement")]
    NoSubnetsAvailable,

    /// A network-resource lookup failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The RunTask call failed or reported a placement failure.
    #[error("task launch failed: {0}")]
    Launch(String),
}

/// Capability of launching one remote task per repository.
///
/// [`TaskDispatcher`] is the production implementation; tests substitute
/// a stub to observe containment behavior without touching ECS.
#[async_trait]
pub trait TaskLauncher: Send + Sync {
    /// Launch a task carrying a pre-minted bearer token. Returns the
    /// remote task identifier.
    async fn launch_with_token(
        &self,
        installation_token: &str,
        repository: &str,
        endpoint: &str,
    ) -> Result<String, DispatchError>;

    /// Launch a task carrying only identity material.
    async fn launch_with_identity(&self, identity: &TaskIdentity)
        -> Result<String, DispatchError>;
}

/// Dispatcher bound to one cluster/task-definition configuration.
pub struct TaskDispatcher {
    ecs: aws_sdk_ecs::Client,
    ec2: aws_sdk_ec2::Client,
    config: DispatchConfig,
}

impl TaskDispatcher {
    /// Build a dispatcher using the ambient AWS credential chain.
    pub async fn new(config: DispatchConfig) -> Self {
        let sdk = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            ecs: aws_sdk_ecs::Client::new(&sdk),
            ec2: aws_sdk_ec2::Client::new(&sdk),
            config,
        }
    }

    /// Build a dispatcher over existing service clients.
    pub fn with_clients(
        ecs: aws_sdk_ecs::Client,
        ec2: aws_sdk_ec2::Client,
        config: DispatchConfig,
    ) -> Self {
        Self { ecs, ec2, config }
    }

    /// Resolve placement, submit the launch, and return the task ARN.
    async fn run_task(
        &self,
        environment: Vec<KeyValuePair>,
        repository: &str,
    ) -> Result<String, DispatchError> {
        let subnets =
            network::resolve_subnets(&self.ec2, self.config.subnets.as_deref()).await?;
        let security_groups =
            network::resolve_security_groups(&self.ec2, self.config.security_groups.as_deref())
                .await?;
        let vpc = network::awsvpc_configuration(
            &subnets,
            &security_groups,
            self.config.assign_public_ip,
        )?;

        let output = self
            .ecs
            .run_task()
            .cluster(&self.config.cluster)
            .task_definition(&self.config.task_definition)
            .launch_type(LaunchType::Fargate)
            .network_configuration(
                NetworkConfiguration::builder()
                    .awsvpc_configuration(vpc)
                    .build(),
            )
            .overrides(
                TaskOverride::builder()
                    .container_overrides(
                        ContainerOverride::builder()
                            .name(&self.config.container)
                            .set_environment(Some(environment))
                            .build(),
                    )
                    .build(),
            )
            .send()
            .await
            .map_err(|e| DispatchError::Launch(format!("{}", DisplayErrorContext(&e))))?;

        if let Some(failure) = output.failures().first() {
            return Err(DispatchError::Launch(format!(
                "{}: {}",
                failure.reason().unwrap_or("unknown reason"),
                failure.detail().unwrap_or("no detail"),
            )));
        }

        let task_arn = output
            .tasks()
            .first()
            .and_then(|task| task.task_arn())
            .map(str::to_string)
            .ok_or_else(|| DispatchError::Launch("RunTask returned no task".to_string()))?;

        tracing::info!(repository, task_arn = %task_arn, "Launched renovate task");
        Ok(task_arn)
    }
}

#[async_trait]
impl TaskLauncher for TaskDispatcher {
    async fn launch_with_token(
        &self,
        installation_token: &str,
        repository: &str,
        endpoint: &str,
    ) -> Result<String, DispatchError> {
        self.run_task(
            token_environment(installation_token, repository, endpoint),
            repository,
        )
        .await
    }

    async fn launch_with_identity(
        &self,
        identity: &TaskIdentity,
    ) -> Result<String, DispatchError> {
        self.run_task(identity_environment(identity), &identity.repository)
            .await
    }
}

/// Environment override for the token-handoff variant: the task receives
/// a ready-to-use bearer token for exactly one repository set.
fn token_environment(
    installation_token: &str,
    repository: &str,
    endpoint: &str,
) -> Vec<KeyValuePair> {
    vec![
        pair("RENOVATE_ENDPOINT", endpoint),
        pair("RENOVATE_TOKEN", installation_token),
        pair("RENOVATE_REPOSITORIES", repository),
    ]
}

/// Environment override for the identity-handoff variant: the task
/// receives identifiers and a secret reference and mints its own token;
/// no live token transits task metadata.
fn identity_environment(identity: &TaskIdentity) -> Vec<KeyValuePair> {
    vec![
        pair("GITHUB_APPLICATION_ID", &identity.application_id),
        pair("GITHUB_INSTALLATION_ID", &identity.installation_id.to_string()),
        pair("GITHUB_TARGET_REPOSITORY", &identity.repository),
        pair(
            "GITHUB_APPLICATION_PRIVATE_PEM_AWS_SECRET",
            &identity.pem_secret_arn,
        ),
    ]
}

fn pair(name: &str, value: &str) -> KeyValuePair {
    KeyValuePair::builder().name(name).value(value).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_map(pairs: &[KeyValuePair]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|p| {
                (
                    p.name().unwrap_or_default().to_string(),
                    p.value().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_token_environment_carries_repository_and_credential() {
        let env = env_map(&token_environment(
            "ghs_abc",
            "org/app",
            "https://ghe.example.com/api/v3/",
        ));
        assert_eq!(
            env,
            vec![
                (
                    "RENOVATE_ENDPOINT".to_string(),
                    "https://ghe.example.com/api/v3/".to_string()
                ),
                ("RENOVATE_TOKEN".to_string(), "ghs_abc".to_string()),
                ("RENOVATE_REPOSITORIES".to_string(), "org/app".to_string()),
            ],
        );
    }

    #[test]
    fn test_identity_environment_carries_no_token() {
        let identity = TaskIdentity {
            application_id: "12345".to_string(),
            installation_id: 42,
            repository: "org/app".to_string(),
            pem_secret_arn: "arn:aws:secretsmanager:us-east-1:1:secret:pem".to_string(),
        };
        let env = env_map(&identity_environment(&identity));

        assert!(env.iter().all(|(name, _)| !name.contains("TOKEN")));
        assert!(env.contains(&("GITHUB_INSTALLATION_ID".to_string(), "42".to_string())));
        assert!(env.contains(&(
            "GITHUB_TARGET_REPOSITORY".to_string(),
            "org/app".to_string()
        )));
    }
}
