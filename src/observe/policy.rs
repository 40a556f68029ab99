use std::collections::HashSet;

use crate::graph::Node;

/// Field names that are back-references into the pipeline's wiring.
pub const DEFAULT_IGNORED_PROPERTIES: &[&str] = &["$app", "$handleRequest", "$platform"];

/// Node tags that are never wrapped when reached as a nested value.
pub const DEFAULT_IGNORED_TYPES: &[&str] = &["Jovo"];

/// Decides which fields and values are observed.
#[derive(Debug, Clone)]
pub struct ObservePolicy {
    ignored_properties: HashSet<String>,
    ignored_types: HashSet<String>,
}

impl Default for ObservePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_IGNORED_PROPERTIES.iter().map(|s| s.to_string()),
            DEFAULT_IGNORED_TYPES.iter().map(|s| s.to_string()),
        )
    }
}

impl ObservePolicy {
    pub fn new(
        ignored_properties: impl IntoIterator<Item = String>,
        ignored_types: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            ignored_properties: ignored_properties.into_iter().collect(),
            ignored_types: ignored_types.into_iter().collect(),
        }
    }

    pub fn ignores_property(&self, key: &str) -> bool {
        self.ignored_properties.contains(key)
    }

    pub fn ignores_type(&self, tag: Option<&str>) -> bool {
        tag.is_some_and(|tag| self.ignored_types.contains(tag))
    }

    /// Whether the composite found under `key` should be wrapped on read.
    ///
    /// Empty composites carry no information and are handed out raw.
    pub fn should_wrap(&self, key: &str, child: &Node) -> bool {
        !self.ignores_property(key)
            && !child.is_empty()
            && !self.ignores_type(child.tag().as_deref())
    }
}
