//! Service seams. Binaries implement these against the AWS SDK clients;
//! tests implement them with in-memory fakes.

pub mod counter_store;
pub mod notifier;
pub mod query_service;
