//! Shared site analytics domain primitives.
//!
//! This crate owns the query definitions, result contracts, report rendering,
//! and counter contract. It intentionally excludes AWS SDK and Lambda runtime
//! concerns; those live in `site_analytics_lambda`.

pub mod contract;
pub mod queries;
pub mod report;
