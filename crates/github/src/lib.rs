//! GitHub App credential federation and installation enumeration.
//!
//! Turns a long-lived App private key into short-lived bearer
//! credentials (signed assertion, then installation token, optionally
//! narrowed to one repository), and walks every installation of the app
//! and every repository visible to each installation.

pub mod api;
pub mod client;
pub mod enumerate;
pub mod error;
pub mod jwt;

pub use api::{Installation, InstallationToken, Page, Repository};
pub use client::{api_root, ClientError, GitHubClient};
pub use enumerate::{
    app_client, find_installation_for, generate_repository_token, visit_all_repositories,
    visit_installation_repositories, InstallationVisitor, RepositoryVisitor,
};
pub use error::GitHubError;
pub use jwt::{generate_app_jwt, AppClaims, JwtError};
