//! Property tests for update emission
//!
//! Writing a value equal to the current one never emits; every other write
//! emits exactly once with the written value.

use std::sync::Arc;

use debug_bridge::{
    CorrelationId, Node, ObservableContainer, ObservePolicy, Observer, RecordingTransport,
    SharedTransport, UpdateEmitter, Value,
};
use proptest::prelude::*;

fn observer() -> (Observer, Arc<RecordingTransport>) {
    let recording = Arc::new(RecordingTransport::new());
    let slot = SharedTransport::default();
    slot.attach(recording.clone());
    (
        Observer::new(Arc::new(ObservePolicy::default()), UpdateEmitter::new(slot)),
        recording,
    )
}

proptest! {
    #[test]
    fn test_only_effective_writes_emit(
        initial in 0i64..4,
        writes in proptest::collection::vec(0i64..4, 0..24),
    ) {
        let (observer, recording) = observer();
        let root = Node::map().with("data", Node::map().with("n", initial));
        let view = observer.wrap_node(root, CorrelationId::new(), "$session");
        let data = view.get("data").into_container().unwrap();

        let mut current = initial;
        let mut expected = Vec::new();
        for value in &writes {
            data.set("n", Value::from(*value));
            if *value != current {
                expected.push(serde_json::json!(value));
                current = *value;
            }
        }

        let updates = recording.updates();
        let emitted: Vec<serde_json::Value> = updates.iter().map(|u| u.data.value.clone()).collect();
        prop_assert_eq!(emitted, expected);
        prop_assert!(updates.iter().all(|u| u.data.path == "$session.data.n"));
    }

    #[test]
    fn test_rewriting_equal_structures_is_silent(
        items in proptest::collection::vec(any::<i32>(), 0..8),
    ) {
        let (observer, recording) = observer();
        let json = serde_json::json!({ "items": items });
        let root = Node::map().with("state", Value::from_json(json.clone()));
        let view = observer.wrap_node(root, CorrelationId::new(), "");

        view.set("state", Value::from_json(json));
        prop_assert!(recording.updates().is_empty());
    }
}
