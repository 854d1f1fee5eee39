//! Re-exports of the domain primitives the handlers and binaries build on.

pub use site_analytics_core::{contract, queries, report};
