// ABOUTME: Library root for strato-api - the API client layer of the Strato CLI.
// ABOUTME: CLI commands, config persistence, and transports live in sibling crates.

pub mod auth;
pub mod config;
pub mod error;
pub mod instances;
pub mod logs;
pub mod types;
