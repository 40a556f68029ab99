use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{Entry, ObservableContainer, ObservePolicy, UpdateEmitter, IDENTITY_PROBE};
use crate::correlate::CorrelationId;
use crate::graph::{join_path, Node, SetOutcome, Value};

/// Registry key: the container node's id and the field the view was read
/// from. The root wrap uses `(0, "")`.
type SlotKey = (usize, String);

/// A registered view, together with the container it was read from so the
/// container's id cannot be reused while the entry exists.
struct Registered {
    container: Option<Node>,
    view: Weak<ObservedView>,
}

/// State shared by every view derived from one root wrap.
struct Scope {
    request_id: CorrelationId,
    policy: Arc<ObservePolicy>,
    emitter: UpdateEmitter,
    /// Wrap registry, one view per slot. A node reachable through two fields
    /// gets one view per field, each reporting its own path.
    registry: Mutex<HashMap<SlotKey, Registered>>,
}

impl Scope {
    /// Return the registered view for the `key` field of `container`,
    /// creating one if none is alive or the slot now holds a different node.
    fn memoized(
        self: &Arc<Self>,
        container: Option<&Node>,
        key: &str,
        node: Node,
        path: String,
    ) -> Arc<ObservedView> {
        let slot = (container.map_or(0, Node::id), key.to_string());
        let mut registry = self.registry.lock();
        let registered = registry.get(&slot).filter(|entry| {
            match (&entry.container, container) {
                (Some(held), Some(current)) => held.ptr_eq(current),
                (None, None) => true,
                _ => false,
            }
        });
        if let Some(existing) = registered.and_then(|entry| entry.view.upgrade()) {
            if existing.node.ptr_eq(&node) {
                return existing;
            }
        }

        let view = Arc::new(ObservedView {
            node,
            path,
            scope: self.clone(),
        });
        registry.retain(|_, entry| entry.view.strong_count() > 0);
        registry.insert(
            slot,
            Registered {
                container: container.cloned(),
                view: Arc::downgrade(&view),
            },
        );
        view
    }
}

/// Observed view over a session graph node.
pub struct ObservedView {
    node: Node,
    path: String,
    scope: Arc<Scope>,
}

impl ObservedView {
    pub fn request_id(&self) -> CorrelationId {
        self.scope.request_id
    }

    /// Dotted path from the wrapped root to this node.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl ObservableContainer for ObservedView {
    fn get(&self, key: &str) -> Entry {
        if key == IDENTITY_PROBE {
            return Entry::Value(Value::Bool(true));
        }

        let Some(slot) = self.node.slot(key) else {
            return Entry::Missing;
        };
        let child = match slot.value {
            Value::Composite(child) => child,
            other => return Entry::Value(other),
        };

        if !self.scope.policy.should_wrap(key, &child) {
            return Entry::Nested(Arc::new(child));
        }

        let path = join_path(&self.path, key);
        if !slot.writable {
            // Read-only slot: observe through a fresh view, leave the
            // container untouched.
            return Entry::Nested(Arc::new(ObservedView {
                node: child,
                path,
                scope: self.scope.clone(),
            }));
        }

        Entry::Nested(self.scope.memoized(Some(&self.node), key, child, path))
    }

    fn set(&self, key: &str, value: Value) {
        let previous = match self.node.set(key, value.clone()) {
            SetOutcome::Stored { previous } => previous,
            SetOutcome::Rejected => {
                tracing::trace!(
                    request_id = %self.scope.request_id,
                    path = %join_path(&self.path, key),
                    "Ignoring rejected write"
                );
                return;
            }
        };

        if self.scope.policy.ignores_property(key) {
            return;
        }
        if previous.is_some_and(|previous| previous.deep_eq(&value)) {
            return;
        }

        self.scope.emitter.emit(
            self.scope.request_id,
            key,
            value.to_json(),
            join_path(&self.path, key),
        );
    }

    fn keys(&self) -> Vec<String> {
        self.node.keys()
    }

    fn target(&self) -> Node {
        self.node.clone()
    }

    fn is_observed(&self) -> bool {
        true
    }
}

/// Wraps session graphs for one correlation id at a time.
#[derive(Clone)]
pub struct Observer {
    policy: Arc<ObservePolicy>,
    emitter: UpdateEmitter,
}

impl Observer {
    pub fn new(policy: Arc<ObservePolicy>, emitter: UpdateEmitter) -> Self {
        Self { policy, emitter }
    }

    pub fn policy(&self) -> &ObservePolicy {
        &self.policy
    }

    pub fn emitter(&self) -> &UpdateEmitter {
        &self.emitter
    }

    /// Wrap a raw node. Each call starts a fresh wrap registry.
    pub fn wrap_node(
        &self,
        root: Node,
        request_id: CorrelationId,
        base_path: &str,
    ) -> Arc<ObservedView> {
        let scope = Arc::new(Scope {
            request_id,
            policy: self.policy.clone(),
            emitter: self.emitter.clone(),
            registry: Mutex::new(HashMap::new()),
        });
        scope.memoized(None, "", root, base_path.to_string())
    }

    /// Wrap a container. Already-observed containers are returned unchanged.
    pub fn wrap(
        &self,
        root: Arc<dyn ObservableContainer>,
        request_id: CorrelationId,
        base_path: &str,
    ) -> Arc<dyn ObservableContainer> {
        if root.is_observed() {
            return root;
        }
        self.wrap_node(root.target(), request_id, base_path)
    }
}
