use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::value::Value;

/// Shape of a composite node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Map,
    List,
}

/// A single mapping field.
#[derive(Debug, Clone)]
pub struct Slot {
    pub value: Value,
    /// Non-writable slots reject stores and are never memoized into.
    pub writable: bool,
}

/// Largest gap a sequence write may pad with `Null` past the current end.
pub const MAX_SEQUENCE_PADDING: usize = 1024;

/// Result of storing into a node.
#[derive(Debug, Clone)]
pub enum SetOutcome {
    /// The value was stored. `previous` is `None` when the field did not exist.
    Stored { previous: Option<Value> },
    /// The slot is read-only, the key does not address the node, or a
    /// sequence index lies too far past the end.
    Rejected,
}

enum Body {
    Map(BTreeMap<String, Slot>),
    List(Vec<Value>),
}

struct NodeData {
    body: Body,
    tag: Option<String>,
}

/// Shared, identity-bearing composite value.
///
/// Cloning a `Node` clones the reference, not the contents. Two nodes are the
/// same object exactly when [`Node::ptr_eq`] holds.
#[derive(Clone)]
pub struct Node {
    inner: Arc<Mutex<NodeData>>,
}

impl Node {
    fn with_body(body: Body) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NodeData { body, tag: None })),
        }
    }

    /// Create an empty mapping.
    pub fn map() -> Self {
        Self::with_body(Body::Map(BTreeMap::new()))
    }

    /// Create an empty sequence.
    pub fn list() -> Self {
        Self::with_body(Body::List(Vec::new()))
    }

    /// Create a sequence from existing values.
    pub fn list_from(values: Vec<Value>) -> Self {
        Self::with_body(Body::List(values))
    }

    /// Attach a type tag (e.g. `"Jovo"`), used by the observation policy to
    /// exclude whole types from wrapping.
    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        self.inner.lock().tag = Some(tag.into());
        self
    }

    pub fn tag(&self) -> Option<String> {
        self.inner.lock().tag.clone()
    }

    pub fn kind(&self) -> NodeKind {
        match self.inner.lock().body {
            Body::Map(_) => NodeKind::Map,
            Body::List(_) => NodeKind::List,
        }
    }

    /// Stable identity of this node for as long as it is alive.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        match &self.inner.lock().body {
            Body::Map(map) => map.len(),
            Body::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field names in iteration order. Sequences report their indices.
    pub fn keys(&self) -> Vec<String> {
        match &self.inner.lock().body {
            Body::Map(map) => map.keys().cloned().collect(),
            Body::List(list) => (0..list.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Snapshot of a field. Sequence elements are always writable.
    pub fn slot(&self, key: &str) -> Option<Slot> {
        match &self.inner.lock().body {
            Body::Map(map) => map.get(key).cloned(),
            Body::List(list) => key
                .parse::<usize>()
                .ok()
                .and_then(|idx| list.get(idx))
                .map(|value| Slot {
                    value: value.clone(),
                    writable: true,
                }),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.slot(key).map(|slot| slot.value)
    }

    /// Store `value` at `key`.
    ///
    /// Writing a sequence at `len` appends; writing past it pads with `Null`,
    /// up to [`MAX_SEQUENCE_PADDING`] slots.
    pub fn set(&self, key: &str, value: Value) -> SetOutcome {
        let mut data = self.inner.lock();
        match &mut data.body {
            Body::Map(map) => match map.get_mut(key) {
                Some(slot) if !slot.writable => SetOutcome::Rejected,
                Some(slot) => {
                    let previous = std::mem::replace(&mut slot.value, value);
                    SetOutcome::Stored {
                        previous: Some(previous),
                    }
                }
                None => {
                    map.insert(
                        key.to_string(),
                        Slot {
                            value,
                            writable: true,
                        },
                    );
                    SetOutcome::Stored { previous: None }
                }
            },
            Body::List(list) => {
                let Ok(idx) = key.parse::<usize>() else {
                    return SetOutcome::Rejected;
                };
                if idx < list.len() {
                    let previous = std::mem::replace(&mut list[idx], value);
                    SetOutcome::Stored {
                        previous: Some(previous),
                    }
                } else if idx - list.len() > MAX_SEQUENCE_PADDING {
                    SetOutcome::Rejected
                } else {
                    list.resize(idx, Value::Null);
                    list.push(value);
                    SetOutcome::Stored { previous: None }
                }
            }
        }
    }

    /// Insert a read-only field. Has no effect on sequences.
    pub fn define_readonly(&self, key: &str, value: Value) {
        if let Body::Map(map) = &mut self.inner.lock().body {
            map.insert(
                key.to_string(),
                Slot {
                    value,
                    writable: false,
                },
            );
        }
    }

    /// Builder-style insert used when assembling graphs.
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn push(&self, value: Value) {
        if let Body::List(list) = &mut self.inner.lock().body {
            list.push(value);
        }
    }

    /// Copy of the children, so callers never hold the lock while recursing;
    /// a node may reference itself.
    fn entries(&self) -> Vec<(String, Value)> {
        match &self.inner.lock().body {
            Body::Map(map) => map
                .iter()
                .map(|(k, slot)| (k.clone(), slot.value.clone()))
                .collect(),
            Body::List(list) => list
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
        }
    }

    /// Compare contents value by value. Pairs already being compared further
    /// up count as equal, which ends the walk on cycles.
    pub(super) fn structurally_eq(&self, other: &Node, visiting: &mut Vec<(usize, usize)>) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.kind() != other.kind() || self.tag() != other.tag() {
            return false;
        }
        let pair = (self.id(), other.id());
        if visiting.contains(&pair) {
            return true;
        }

        let ours = self.entries();
        let theirs = other.entries();
        if ours.len() != theirs.len() {
            return false;
        }

        visiting.push(pair);
        let equal = ours
            .iter()
            .zip(theirs.iter())
            .all(|((ka, va), (kb, vb))| ka == kb && va.eq_within(vb, visiting));
        visiting.pop();
        equal
    }

    /// Materialize into an owned JSON value. Cycles are cut with
    /// [`super::CIRCULAR_MARKER`].
    pub fn to_json(&self) -> serde_json::Value {
        let mut stack = Vec::new();
        self.materialize(&mut stack)
    }

    pub(super) fn materialize(&self, stack: &mut Vec<usize>) -> serde_json::Value {
        if stack.contains(&self.id()) {
            return serde_json::Value::String(super::CIRCULAR_MARKER.to_string());
        }
        stack.push(self.id());

        let entries = self.entries();
        let out = match self.kind() {
            NodeKind::Map => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.materialize(stack)))
                    .collect(),
            ),
            NodeKind::List => serde_json::Value::Array(
                entries
                    .into_iter()
                    .map(|(_, v)| v.materialize(stack))
                    .collect(),
            ),
        };

        stack.pop();
        out
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("tag", &self.tag())
            .field("len", &self.len())
            .field("id", &format_args!("{:#x}", self.id()))
            .finish()
    }
}
