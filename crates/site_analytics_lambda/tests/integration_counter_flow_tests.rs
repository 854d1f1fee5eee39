use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};
use site_analytics_lambda::adapters::counter_store::CounterStore;
use site_analytics_lambda::error::BackendError;
use site_analytics_lambda::handlers::counter::handle_counter_event;
use site_analytics_lambda::runtime::contract::{CounterResponse, IncrementRequest};

/// Applies each conditional update under the store lock, the way the real
/// store serialises writes to a single item.
struct InMemoryCounterStore {
    items: Mutex<HashMap<String, HashMap<String, i64>>>,
}

impl InMemoryCounterStore {
    fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    fn stored(&self, key: &str, attribute: &str) -> Option<i64> {
        self.items
            .lock()
            .expect("poisoned mutex")
            .get(key)
            .and_then(|item| item.get(attribute))
            .copied()
    }
}

impl CounterStore for InMemoryCounterStore {
    fn atomic_increment(&self, request: &IncrementRequest) -> Result<i64, BackendError> {
        let mut items = self.items.lock().expect("poisoned mutex");
        let value = items
            .entry(request.key.clone())
            .or_default()
            .entry(request.attribute.clone())
            .or_insert(request.start);
        *value += request.delta;
        Ok(*value)
    }
}

fn post_event() -> Value {
    json!({"requestContext": {"http": {"method": "POST"}}})
}

fn count_from(body: &str) -> i64 {
    serde_json::from_str::<CounterResponse>(body)
        .expect("body should be a count object")
        .count
}

#[test]
fn sequential_invocations_count_up_from_missing_record() {
    let store = InMemoryCounterStore::new();

    let bodies: Vec<String> = (0..3)
        .map(|_| {
            handle_counter_event(&post_event(), &store)
                .expect("increment succeeds")
                .body
        })
        .collect();

    assert_eq!(bodies, [r#"{"count":1}"#, r#"{"count":2}"#, r#"{"count":3}"#]);
    assert_eq!(store.stored("visitor-count", "count"), Some(3));
}

#[test]
fn concurrent_invocations_never_lose_increments() {
    const INVOCATIONS: usize = 64;
    let store = InMemoryCounterStore::new();

    let mut counts: Vec<i64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..INVOCATIONS)
            .map(|_| {
                scope.spawn(|| {
                    let response =
                        handle_counter_event(&post_event(), &store).expect("increment succeeds");
                    count_from(&response.body)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    });

    counts.sort_unstable();
    let expected: Vec<i64> = (1..=INVOCATIONS as i64).collect();
    assert_eq!(counts, expected);
    assert_eq!(
        store.stored("visitor-count", "count"),
        Some(INVOCATIONS as i64)
    );
}

#[test]
fn preflight_between_increments_leaves_count_untouched() {
    let store = InMemoryCounterStore::new();
    let preflight = json!({"requestContext": {"http": {"method": "OPTIONS"}}});

    handle_counter_event(&post_event(), &store).expect("increment succeeds");
    let response = handle_counter_event(&preflight, &store).expect("preflight succeeds");

    assert!(response.body.is_empty());
    assert_eq!(store.stored("visitor-count", "count"), Some(1));
}
