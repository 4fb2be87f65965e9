//! Shared configuration value objects for the renovo workspace.
//!
//! Everything the binary parses at the edge is carried down the call
//! chain as explicit values; no crate in this workspace reads ambient
//! globals after startup.

pub mod config;

pub use config::{CredentialMode, GitHubAppConfig, ParseCredentialModeError};
