//! AWS-facing side of the Security Hub findings adapter.
//!
//! This crate owns runtime integration details (credential resolution,
//! request signing, transport, row export and the CLI/Lambda entry points)
//! on top of the query semantics in `securityhub_core`.

pub mod client;
pub mod config;
pub mod export;
pub mod logging;
pub mod retry;
