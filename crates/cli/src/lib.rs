//! `renovo-cli` library crate.
//!
//! Re-exports the command modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod commands;
