//! Typed wrappers over the GitHub App REST operations the controller
//! consumes: installation listing, installation lookup, token exchange,
//! and the repository listing visible to an installation token.

use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;

use crate::client::{ClientError, GitHubClient};
use crate::error::GitHubError;

/// Fixed page size for every paginated listing.
pub(crate) const PER_PAGE: u32 = 10;

/// Account that owns an installation or repository.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub login: String,
}

/// One installation of the app on an account.
#[derive(Debug, Clone, Deserialize)]
pub struct Installation {
    pub id: i64,
    pub account: Account,
}

/// A repository visible to an installation.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: Account,
}

/// Bearer credential bound to one installation. The expiry is set by the
/// remote authority, not locally.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallationToken {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// One page of a listing plus the next-page indicator taken from the
/// `Link` response header. `None` means the listing is exhausted.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

/// Response envelope of `GET installation/repositories`.
#[derive(Debug, Deserialize)]
struct RepositoryListing {
    repositories: Vec<Repository>,
}

/// Extract the `rel="next"` page number from a `Link` response header.
///
/// GitHub paginates with
/// `Link: <https://...?page=3>; rel="next", <https://...?page=7>; rel="last"`.
/// No `rel="next"` entry means the final page has been served.
pub(crate) fn next_page(headers: &HeaderMap) -> Option<u32> {
    let link = headers.get(LINK)?.to_str().ok()?;
    for entry in link.split(',') {
        let mut sections = entry.split(';');
        let url = sections
            .next()
            .map(|s| s.trim().trim_start_matches('<').trim_end_matches('>'))
            .unwrap_or_default();
        if !sections.any(|s| s.trim() == "rel=\"next\"") {
            continue;
        }
        let parsed = reqwest::Url::parse(url).ok()?;
        return parsed
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok());
    }
    None
}

impl GitHubClient {
    /// List one page of the app's installations.
    pub async fn list_installations(&self, page: u32) -> Result<Page<Installation>, GitHubError> {
        let page_fetch = |source| GitHubError::PageFetch {
            resource: "installations",
            page,
            source,
        };

        let response = self
            .get(&format!("app/installations?per_page={PER_PAGE}&page={page}"))
            .await
            .map_err(page_fetch)?;
        let next = next_page(response.headers());
        let response = Self::ensure_success(response).await.map_err(page_fetch)?;
        let items = response
            .json()
            .await
            .map_err(|e| page_fetch(ClientError::Request(e)))?;

        Ok(Page {
            items,
            next_page: next,
        })
    }

    /// Fetch a single installation by ID.
    pub async fn get_installation(&self, installation_id: i64) -> Result<Installation, GitHubError> {
        let response = self
            .get(&format!("app/installations/{installation_id}"))
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await.map_err(ClientError::Request)?)
    }

    /// Exchange the app assertion for an installation access token.
    ///
    /// When `repositories` is supplied the token is restricted to those
    /// repositories; otherwise it is valid for every repository of the
    /// installation. The token is never more privileged than the
    /// installation it was minted against.
    pub async fn create_installation_token(
        &self,
        installation_id: i64,
        repositories: Option<&[String]>,
    ) -> Result<InstallationToken, GitHubError> {
        let body = match repositories {
            Some(repos) => serde_json::json!({ "repositories": repos }),
            None => serde_json::json!({}),
        };

        let response = self
            .post_json(
                &format!("app/installations/{installation_id}/access_tokens"),
                &body,
            )
            .await?;
        let response = Self::ensure_success(response)
            .await
            .map_err(|e| match e {
                ClientError::Api { status, body } => GitHubError::TokenExchange {
                    status,
                    message: body,
                },
                other => GitHubError::Client(other),
            })?;
        Ok(response.json().await.map_err(ClientError::Request)?)
    }

    /// List one page of the repositories visible to this client's
    /// installation token.
    pub async fn list_installation_repositories(
        &self,
        page: u32,
    ) -> Result<Page<Repository>, GitHubError> {
        let page_fetch = |source| GitHubError::PageFetch {
            resource: "installation repositories",
            page,
            source,
        };

        let response = self
            .get(&format!(
                "installation/repositories?per_page={PER_PAGE}&page={page}"
            ))
            .await
            .map_err(page_fetch)?;
        let next = next_page(response.headers());
        let response = Self::ensure_success(response).await.map_err(page_fetch)?;
        let listing: RepositoryListing = response
            .json()
            .await
            .map_err(|e| page_fetch(ClientError::Request(e)))?;

        Ok(Page {
            items: listing.repositories,
            next_page: next,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with_link(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_next_page_parsed_from_link_header() {
        let headers = headers_with_link(
            "<https://api.github.com/app/installations?per_page=10&page=3>; rel=\"next\", \
             <https://api.github.com/app/installations?per_page=10&page=7>; rel=\"last\"",
        );
        assert_eq!(next_page(&headers), Some(3));
    }

    #[test]
    fn test_no_next_relation_means_exhausted() {
        let headers = headers_with_link(
            "<https://api.github.com/app/installations?page=1>; rel=\"first\", \
             <https://api.github.com/app/installations?page=2>; rel=\"prev\"",
        );
        assert_eq!(next_page(&headers), None);
    }

    #[test]
    fn test_missing_link_header_means_exhausted() {
        assert_eq!(next_page(&HeaderMap::new()), None);
    }
}
