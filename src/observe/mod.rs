//! Deep observation of a session graph.
//!
//! Application code reads and writes session state through
//! [`ObservableContainer`]. A plain [`Node`] implements it directly; an
//! [`ObservedView`] implements it by delegating to the node and reporting every
//! effective write as an update event. Nested composites are wrapped lazily on
//! first read, so the application never sees the difference.

mod emitter;
mod policy;
mod view;

use std::fmt;
use std::sync::Arc;

pub use emitter::{emit_update, UpdateEmitter};
pub use policy::{ObservePolicy, DEFAULT_IGNORED_PROPERTIES, DEFAULT_IGNORED_TYPES};
pub use view::{ObservedView, Observer};

use crate::graph::{Node, Value};

/// Reserved key every observed view answers with `true`.
pub const IDENTITY_PROBE: &str = "__isProxy";

/// Field-level access to a session graph.
pub trait ObservableContainer: Send + Sync {
    fn get(&self, key: &str) -> Entry;

    /// Store a value. Never fails because of observation.
    fn set(&self, key: &str, value: Value);

    fn keys(&self) -> Vec<String>;

    /// The underlying node.
    fn target(&self) -> Node;

    /// Identity probe: `true` only for observed views.
    fn is_observed(&self) -> bool {
        false
    }

    fn snapshot(&self) -> serde_json::Value {
        self.target().to_json()
    }
}

/// Result of reading a field.
#[derive(Clone)]
pub enum Entry {
    Missing,
    Value(Value),
    Nested(Arc<dyn ObservableContainer>),
}

impl Entry {
    pub fn is_missing(&self) -> bool {
        matches!(self, Entry::Missing)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_container(self) -> Option<Arc<dyn ObservableContainer>> {
        match self {
            Entry::Nested(container) => Some(container),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Entry::Missing => serde_json::Value::Null,
            Entry::Value(value) => value.to_json(),
            Entry::Nested(container) => container.snapshot(),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Missing => f.write_str("Missing"),
            Entry::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Entry::Nested(container) => f
                .debug_struct("Nested")
                .field("observed", &container.is_observed())
                .field("target", &container.target())
                .finish(),
        }
    }
}

/// Whether two containers are the same instance.
pub fn same_container(a: &Arc<dyn ObservableContainer>, b: &Arc<dyn ObservableContainer>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl ObservableContainer for Node {
    fn get(&self, key: &str) -> Entry {
        match Node::get(self, key) {
            None => Entry::Missing,
            Some(Value::Composite(child)) => Entry::Nested(Arc::new(child)),
            Some(value) => Entry::Value(value),
        }
    }

    fn set(&self, key: &str, value: Value) {
        Node::set(self, key, value);
    }

    fn keys(&self) -> Vec<String> {
        Node::keys(self)
    }

    fn target(&self) -> Node {
        self.clone()
    }
}
