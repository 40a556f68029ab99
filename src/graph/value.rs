use chrono::{DateTime, Utc};
use serde_json::Number;

use super::node::Node;

/// A value stored in the session graph.
///
/// `Timestamp` and `Opaque` are leaves that are never wrapped for
/// observation; only `Composite` can be.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Handle to something outside the graph (the app, the platform, the
    /// in-flight request). Materializes as its label.
    Opaque(String),
    Composite(Node),
}

impl Value {
    /// Build a fresh graph from JSON. Every object and array becomes a new node.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Composite(Node::list_from(
                items.into_iter().map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(map) => {
                let node = Node::map();
                for (key, value) in map {
                    node.set(&key, Value::from_json(value));
                }
                Value::Composite(node)
            }
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Composite(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Falsy in the scripting sense: null, false, zero and the empty string.
    pub fn is_falsy(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// A composite with no entries carries no information.
    pub fn is_empty_composite(&self) -> bool {
        self.as_node().is_some_and(Node::is_empty)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut stack = Vec::new();
        self.materialize(&mut stack)
    }

    pub(super) fn materialize(&self, stack: &mut Vec<usize>) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Value::Opaque(label) => serde_json::Value::String(label.clone()),
            Value::Composite(node) => node.materialize(stack),
        }
    }

    /// Structural equality. The same node is always equal to itself; distinct
    /// nodes compare by content, and leaf kinds never match each other.
    pub fn deep_eq(&self, other: &Value) -> bool {
        self.eq_within(other, &mut Vec::new())
    }

    pub(super) fn eq_within(&self, other: &Value, visiting: &mut Vec<(usize, usize)>) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                a == b || matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            (Value::Composite(a), Value::Composite(b)) => a.structurally_eq(b, visiting),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Value::Composite(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_builds_fresh_nodes() {
        let value = Value::from_json(json!({"a": {"b": [1, 2]}, "c": null}));
        let root = value.as_node().unwrap();
        assert_eq!(root.keys(), vec!["a".to_string(), "c".to_string()]);
        assert_eq!(value.to_json(), json!({"a": {"b": [1, 2]}, "c": null}));
    }

    #[test]
    fn deep_eq_compares_content_of_distinct_nodes() {
        let a = Value::from_json(json!({"x": [1, {"y": true}]}));
        let b = Value::from_json(json!({"x": [1, {"y": true}]}));
        let c = Value::from_json(json!({"x": [1, {"y": false}]}));
        assert!(a.deep_eq(&b));
        assert!(!a.deep_eq(&c));
    }

    #[test]
    fn deep_eq_distinguishes_leaf_kinds() {
        assert!(!Value::from("App").deep_eq(&Value::Opaque("App".into())));
        assert!(!Value::Null.deep_eq(&Value::from(false)));
        assert!(Value::from(1).deep_eq(&Value::from(1.0)));
    }

    #[test]
    fn deep_eq_distinguishes_leaf_kinds_inside_composites() {
        let opaque = Value::Composite(Node::map().with("h", Value::Opaque("App".into())));
        let string = Value::Composite(Node::map().with("h", "App"));
        assert!(!opaque.deep_eq(&string));

        let ts = Utc::now();
        let stamped = Value::Composite(Node::list_from(vec![Value::from(ts)]));
        let text = Value::Composite(Node::list_from(vec![Value::from(ts.to_rfc3339())]));
        assert!(!stamped.deep_eq(&text));
    }

    #[test]
    fn deep_eq_terminates_on_cycles() {
        let a = Node::map().with("n", 1);
        a.set("me", Value::Composite(a.clone()));
        let b = Node::map().with("n", 1);
        b.set("me", Value::Composite(b.clone()));
        assert!(Value::Composite(a.clone()).deep_eq(&Value::Composite(b)));

        let c = Node::map().with("n", 2);
        c.set("me", Value::Composite(c.clone()));
        assert!(!Value::Composite(a).deep_eq(&Value::Composite(c)));
    }

    #[test]
    fn empty_list_and_empty_map_differ() {
        let list = Value::Composite(Node::list());
        let map = Value::Composite(Node::map());
        assert!(!list.deep_eq(&map));
        assert!(list.is_empty_composite());
        assert!(map.is_empty_composite());
    }

    #[test]
    fn timestamps_materialize_as_rfc3339() {
        let ts = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            Value::from(ts).to_json(),
            json!("2024-01-02T03:04:05+00:00")
        );
    }
}
