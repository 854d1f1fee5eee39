use crate::error::BackendError;
use crate::runtime::contract::IncrementRequest;

/// Key-value store exposing a single-call conditional increment.
///
/// Implementations must apply "initialise to `start` if absent, then add
/// `delta`" as one atomic store operation and return the post-increment value.
/// Callers never read-then-write.
pub trait CounterStore {
    fn atomic_increment(&self, request: &IncrementRequest) -> Result<i64, BackendError>;
}
