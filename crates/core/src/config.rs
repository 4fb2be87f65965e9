//! Configuration value objects passed down the call chain.

use std::fmt;
use std::str::FromStr;

/// GitHub App identity and endpoint, supplied once at startup.
///
/// The private key is the only long-lived credential in the system;
/// everything else is minted fresh from it per run.
#[derive(Debug, Clone)]
pub struct GitHubAppConfig {
    /// GitHub App application ID (becomes the `iss` claim of every
    /// assertion).
    pub application_id: String,
    /// PEM-encoded RSA private key material.
    pub private_key_pem: String,
    /// GitHub Enterprise Server host; empty selects the public API.
    pub endpoint: String,
}

/// What credential material a dispatched task receives.
///
/// `InstallationToken` hands the task the installation-wide token minted
/// during enumeration. `RepositoryToken` narrows that to a token valid
/// for the one repository. `Identity` hands the task no token at all,
/// only the identifiers and secret reference it needs to mint its own,
/// so a live token never crosses an extra hop of infrastructure logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    InstallationToken,
    RepositoryToken,
    Identity,
}

/// Error returned when a credential mode string is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown credential mode {0:?}, expected one of installation-token, repository-token, identity")]
pub struct ParseCredentialModeError(String);

impl FromStr for CredentialMode {
    type Err = ParseCredentialModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "installation-token" => Ok(Self::InstallationToken),
            "repository-token" => Ok(Self::RepositoryToken),
            "identity" => Ok(Self::Identity),
            other => Err(ParseCredentialModeError(other.to_string())),
        }
    }
}

impl fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InstallationToken => "installation-token",
            Self::RepositoryToken => "repository-token",
            Self::Identity => "identity",
        })
    }
}
