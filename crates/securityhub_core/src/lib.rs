//! Security Hub findings exposed as query-engine rows.
//!
//! This crate owns the deterministic parts of the adapter: query predicates,
//! filter pushdown, pagination, get/list semantics and the column schema.
//! It intentionally excludes transport, signing and AWS configuration; the
//! remote service is reached through the [`api::FindingsApi`] seam.
//! See `crates/securityhub_aws` for the AWS-facing implementation.

pub mod api;
pub mod filters;
pub mod finding;
pub mod hydrate;
pub mod pagination;
pub mod query;
pub mod row;
pub mod schema;
pub mod table;
pub mod transform;
