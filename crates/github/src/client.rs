//! Bearer-authenticated REST client for a GitHub-App-compatible API.
//!
//! One [`GitHubClient`] exists per trust boundary: the app-level client
//! backed by a signed assertion, and one installation-level client per
//! freshly minted installation token. A client's lifetime is bounded by
//! the validity of its backing credential, and clients are never shared
//! across installations.

use reqwest::header::{ACCEPT, USER_AGENT};

/// Public SaaS API host.
const PUBLIC_HOST: &str = "api.github.com";
/// Public SaaS API root.
const PUBLIC_API_ROOT: &str = "https://api.github.com/";

/// Media type GitHub expects on REST calls.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Sent on every request; GitHub rejects requests without a user agent.
const CLIENT_USER_AGENT: &str = concat!("renovo/", env!("CARGO_PKG_VERSION"));

/// Errors from client construction and raw request handling.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The configured endpoint host does not form a valid URL.
    #[error("invalid GitHub endpoint {endpoint:?}: {message}")]
    EndpointParse { endpoint: String, message: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("GitHub API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// Resolve an endpoint host to an API root URL.
///
/// An empty host or the public host selects the SaaS API root. Anything
/// else is treated as a GitHub Enterprise Server host and mapped to the
/// `https://{host}/api/v3/` convention.
pub fn api_root(endpoint: &str) -> Result<String, ClientError> {
    if endpoint.is_empty() || endpoint == PUBLIC_HOST {
        return Ok(PUBLIC_API_ROOT.to_string());
    }

    let base = format!("https://{endpoint}/api/v3/");
    let parsed = reqwest::Url::parse(&base).map_err(|e| ClientError::EndpointParse {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if parsed.host_str().is_none() || parsed.path() != "/api/v3/" {
        return Err(ClientError::EndpointParse {
            endpoint: endpoint.to_string(),
            message: "host must be a bare hostname".to_string(),
        });
    }

    Ok(base)
}

/// REST client bound to one API root and one bearer credential.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitHubClient {
    /// Build a client for `endpoint` authenticating with `token`.
    pub fn new(token: impl Into<String>, endpoint: &str) -> Result<Self, ClientError> {
        Ok(Self::with_base_url(token, api_root(endpoint)?))
    }

    /// Build a client against an already-resolved API root.
    ///
    /// Used when deriving an installation-scoped client from the app
    /// client (same host, different credential) and by tests pointing at
    /// a local fake.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// The normalized API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET against a path (with optional query) under the API root.
    pub(crate) async fn get(&self, path_and_query: &str) -> Result<reqwest::Response, ClientError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path_and_query))
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;
        Ok(response)
    }

    /// Issue a POST with a JSON body against a path under the API root.
    pub(crate) async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ClientError::Api`] carrying
    /// the status and body text on failure.
    pub(crate) async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_empty_endpoint_selects_public_api_root() {
        assert_eq!(api_root("").unwrap(), "https://api.github.com/");
    }

    #[test]
    fn test_public_host_selects_public_api_root() {
        assert_eq!(api_root("api.github.com").unwrap(), "https://api.github.com/");
    }

    #[test]
    fn test_enterprise_host_maps_to_v3_convention() {
        assert_eq!(
            api_root("ghe.example.com").unwrap(),
            "https://ghe.example.com/api/v3/"
        );
    }

    #[test]
    fn test_malformed_host_is_rejected() {
        assert_matches!(
            api_root("ghe example.com"),
            Err(ClientError::EndpointParse { .. })
        );
        assert_matches!(
            api_root("ghe.example.com/extra"),
            Err(ClientError::EndpointParse { .. })
        );
    }

    #[test]
    fn test_with_base_url_normalizes_trailing_slash() {
        let client = GitHubClient::with_base_url("t", "http://127.0.0.1:8080");
        assert_eq!(client.base_url(), "http://127.0.0.1:8080/");
    }
}
