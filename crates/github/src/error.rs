//! Error taxonomy for credential federation and enumeration.

use crate::client::ClientError;
use crate::jwt::JwtError;

/// Errors surfaced by the federation and enumeration operations.
///
/// Everything here aborts the operation that raised it; containment of
/// per-repository dispatch failures happens in the dispatch layer, never
/// in this crate.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    /// Assertion minting failed before any network call.
    #[error(transparent)]
    Jwt(#[from] JwtError),

    /// Client construction or a non-paginated request failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The remote rejected an installation token exchange.
    #[error("installation token exchange failed ({status}): {message}")]
    TokenExchange { status: u16, message: String },

    /// A paginated list call failed; the enumeration is aborted.
    #[error("failed to fetch {resource} page {page}: {source}")]
    PageFetch {
        resource: &'static str,
        page: u32,
        #[source]
        source: ClientError,
    },

    /// No installation of the app covers the requested repository.
    #[error("no installation found for {repository}")]
    NoInstallationFound { repository: String },
}
