//! Exhaustive traversal of a GitHub App's installations and the
//! repositories visible to each installation.
//!
//! The walk is depth-first: one installation at a time, one page at a
//! time, with the visitor invoked inline before the next repository is
//! fetched. Installation tokens are minted fresh per installation and
//! never cached or reused; any page-fetch or token-mint failure aborts
//! the whole walk.

use async_trait::async_trait;
use chrono::Utc;
use renovo_core::GitHubAppConfig;

use crate::api::{Installation, Repository};
use crate::client::GitHubClient;
use crate::error::GitHubError;
use crate::jwt;

/// Capability invoked once per (installation, repository) pair, in API
/// listing order.
///
/// The token handed to the visitor is the installation-wide token the
/// walk minted for the repository's installation; the endpoint is the
/// normalized API root string.
#[async_trait]
pub trait RepositoryVisitor {
    async fn visit_repository(
        &mut self,
        installation: &Installation,
        repository: &Repository,
        installation_token: &str,
        endpoint: &str,
    );
}

/// Capability invoked once per installation, after every repository page
/// of that installation has been exhausted, with the accumulated list of
/// repository full names.
#[async_trait]
pub trait InstallationVisitor {
    async fn visit_installation(
        &mut self,
        repositories: &[String],
        installation_token: &str,
        endpoint: &str,
    );
}

/// Mint a fresh assertion and build the app-level client for `config`.
pub fn app_client(config: &GitHubAppConfig) -> Result<GitHubClient, GitHubError> {
    let assertion = jwt::generate_app_jwt(
        &config.application_id,
        config.private_key_pem.as_bytes(),
        Utc::now(),
    )?;
    Ok(GitHubClient::new(assertion, &config.endpoint)?)
}

/// Mint an unscoped token for `installation` and derive its client.
async fn installation_client(
    app: &GitHubClient,
    installation: &Installation,
) -> Result<(GitHubClient, String), GitHubError> {
    let token = app.create_installation_token(installation.id, None).await?;
    let client = GitHubClient::with_base_url(&token.token, app.base_url());
    Ok((client, token.token))
}

/// Visit every (installation, repository) pair reachable through the app.
///
/// Installations are visited in API listing order, repositories within an
/// installation in API listing order; no ordering across installations is
/// implied.
pub async fn visit_all_repositories<V>(
    app: &GitHubClient,
    visitor: &mut V,
) -> Result<(), GitHubError>
where
    V: RepositoryVisitor + Send,
{
    let mut page = 1;
    loop {
        let installations = app.list_installations(page).await?;
        for installation in &installations.items {
            tracing::debug!(
                installation_id = installation.id,
                account = %installation.account.login,
                "Listing installation repositories",
            );
            let (client, token) = installation_client(app, installation).await?;

            let mut repo_page = 1;
            loop {
                let repositories = client.list_installation_repositories(repo_page).await?;
                for repository in &repositories.items {
                    visitor
                        .visit_repository(installation, repository, &token, app.base_url())
                        .await;
                }
                match repositories.next_page {
                    Some(next) => repo_page = next,
                    None => break,
                }
            }
        }
        match installations.next_page {
            Some(next) => page = next,
            None => break,
        }
    }
    Ok(())
}

/// Visit one installation (by ID) with the full list of its repository
/// names, for callers that want the batch rather than per-pair form.
pub async fn visit_installation_repositories<V>(
    app: &GitHubClient,
    installation_id: i64,
    visitor: &mut V,
) -> Result<(), GitHubError>
where
    V: InstallationVisitor + Send,
{
    let installation = app.get_installation(installation_id).await?;
    let (client, token) = installation_client(app, &installation).await?;

    let mut names = Vec::new();
    let mut page = 1;
    loop {
        let repositories = client.list_installation_repositories(page).await?;
        names.extend(
            repositories
                .items
                .iter()
                .map(|repository| repository.full_name.clone()),
        );
        match repositories.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    visitor
        .visit_installation(&names, &token, app.base_url())
        .await;
    Ok(())
}

/// Locate the installation whose repository set contains `full_name`.
///
/// Performs a full enumeration; the walk stops at the first match.
pub async fn find_installation_for(
    app: &GitHubClient,
    full_name: &str,
) -> Result<Option<Installation>, GitHubError> {
    let mut page = 1;
    loop {
        let installations = app.list_installations(page).await?;
        for installation in installations.items {
            let (client, _token) = installation_client(app, &installation).await?;

            let mut repo_page = 1;
            loop {
                let repositories = client.list_installation_repositories(repo_page).await?;
                if repositories
                    .items
                    .iter()
                    .any(|repository| repository.full_name == full_name)
                {
                    return Ok(Some(installation));
                }
                match repositories.next_page {
                    Some(next) => repo_page = next,
                    None => break,
                }
            }
        }
        match installations.next_page {
            Some(next) => page = next,
            None => break,
        }
    }
    Ok(None)
}

/// Mint a token restricted to a single repository, given an already
/// constructed app client.
///
/// Fails with [`GitHubError::NoInstallationFound`] when no installation
/// of the app covers `owner/repository`.
pub async fn repository_token(
    app: &GitHubClient,
    owner: &str,
    repository: &str,
) -> Result<String, GitHubError> {
    let full_name = format!("{owner}/{repository}");
    let installation = find_installation_for(app, &full_name)
        .await?
        .ok_or(GitHubError::NoInstallationFound {
            repository: full_name,
        })?;

    let token = app
        .create_installation_token(installation.id, Some(&[repository.to_string()]))
        .await?;
    Ok(token.token)
}

/// One-shot path: assertion, app client, installation lookup, and a
/// repository-scoped token, end to end.
pub async fn generate_repository_token(
    config: &GitHubAppConfig,
    owner: &str,
    repository: &str,
) -> Result<String, GitHubError> {
    let app = app_client(config)?;
    repository_token(&app, owner, repository).await
}
