//! AWS-oriented adapters and handlers for the site analytics functions.
//!
//! This crate owns runtime integration details (Lambda handlers, environment
//! configuration, and service adapter traits) and exposes a single runtime
//! module boundary for the query, report, and counter primitives.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod runtime;
pub mod telemetry;
