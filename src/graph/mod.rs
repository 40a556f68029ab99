//! Session object graph.
//!
//! A request's application state is a tree (or, in practice, a graph with
//! back-references) of shared composite nodes and leaf values. The pipeline
//! owns the graph; the debugger only wraps it.

mod node;
mod value;

pub use node::{Node, NodeKind, SetOutcome, Slot, MAX_SEQUENCE_PADDING};
pub use value::Value;

/// Placeholder written in place of a composite that is already being
/// materialized further up the stack.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Join a dotted path with a child key. An empty base yields the key itself.
pub fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}
