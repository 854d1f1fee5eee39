use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::adapters::counter_store::CounterStore;
use crate::error::CounterError;
use crate::runtime::contract::{CounterResponse, IncrementRequest};

pub const PREFLIGHT_METHOD: &str = "OPTIONS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

pub fn cors_headers() -> Value {
    json!({
        "Access-Control-Allow-Origin": "*",
        "Access-Control-Allow-Headers": "Content-Type",
        "Access-Control-Allow-Methods": "POST, OPTIONS",
    })
}

/// Serves one HTTP invocation of the visit counter.
///
/// `OPTIONS` is answered without touching the store. Every other method,
/// including a request with no method at all, performs exactly one atomic
/// increment and returns the new value.
pub fn handle_counter_event(
    event: &Value,
    store: &dyn CounterStore,
) -> Result<ApiGatewayResponse, CounterError> {
    let method = request_method(event);
    if method == Some(PREFLIGHT_METHOD) {
        info!(event = "counter_preflight");
        return Ok(ApiGatewayResponse {
            status_code: 200,
            headers: cors_headers(),
            body: String::new(),
        });
    }

    let count = store.atomic_increment(&IncrementRequest::visitor_count())?;
    info!(
        event = "counter_incremented",
        method = method.unwrap_or(""),
        count
    );

    Ok(ApiGatewayResponse {
        status_code: 200,
        headers: cors_headers(),
        body: serde_json::to_string(&CounterResponse { count })?,
    })
}

fn request_method(event: &Value) -> Option<&str> {
    event
        .get("requestContext")
        .and_then(|context| context.get("http"))
        .and_then(|http| http.get("method"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::error::BackendError;

    use super::*;

    struct RecordingCounterStore {
        values: Mutex<HashMap<(String, String), i64>>,
        calls: Mutex<Vec<IncrementRequest>>,
    }

    impl RecordingCounterStore {
        fn new() -> Self {
            Self {
                values: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<IncrementRequest> {
            self.calls.lock().expect("poisoned mutex").clone()
        }
    }

    impl CounterStore for RecordingCounterStore {
        fn atomic_increment(&self, request: &IncrementRequest) -> Result<i64, BackendError> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push(request.clone());
            let mut values = self.values.lock().expect("poisoned mutex");
            let value = values
                .entry((request.key.clone(), request.attribute.clone()))
                .or_insert(request.start);
            *value += request.delta;
            Ok(*value)
        }
    }

    struct FailingStore;

    impl CounterStore for FailingStore {
        fn atomic_increment(&self, _request: &IncrementRequest) -> Result<i64, BackendError> {
            Err(BackendError::CounterStore(
                "ProvisionedThroughputExceededException".to_string(),
            ))
        }
    }

    fn http_event(method: &str) -> Value {
        json!({
            "version": "2.0",
            "rawPath": "/count",
            "requestContext": {"http": {"method": method, "path": "/count"}},
        })
    }

    #[test]
    fn preflight_returns_cors_headers_without_store_call() {
        let store = RecordingCounterStore::new();

        let response =
            handle_counter_event(&http_event("OPTIONS"), &store).expect("preflight succeeds");

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "");
        assert_eq!(response.headers, cors_headers());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn post_increments_visitor_count() {
        let store = RecordingCounterStore::new();

        let response =
            handle_counter_event(&http_event("POST"), &store).expect("increment succeeds");

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"count":1}"#);
        assert_eq!(
            response.headers["Access-Control-Allow-Methods"],
            "POST, OPTIONS"
        );
        assert_eq!(store.calls(), vec![IncrementRequest::visitor_count()]);
    }

    #[test]
    fn non_preflight_methods_and_missing_method_increment() {
        let store = RecordingCounterStore::new();

        handle_counter_event(&http_event("GET"), &store).expect("GET increments");
        let response = handle_counter_event(&json!({}), &store).expect("bare event increments");

        assert_eq!(response.body, r#"{"count":2}"#);
        assert_eq!(store.calls().len(), 2);
    }

    #[test]
    fn store_failure_propagates() {
        let error = handle_counter_event(&http_event("POST"), &FailingStore)
            .expect_err("store failure should propagate");

        assert!(matches!(
            error,
            CounterError::Store(BackendError::CounterStore(_))
        ));
    }
}
