use std::sync::Arc;

use super::{Platform, PipelineError, RequestContext, Session, REQUEST_FIELD, RESPONSE_FIELD};
use crate::graph::{Node, Value};

/// Tag carried by every session root built by [`CorePlatform`].
pub const SESSION_TAG: &str = "Jovo";

/// Generic platform that builds the standard session graph from a raw
/// request payload.
#[derive(Debug, Clone)]
pub struct CorePlatform {
    name: String,
    catch_all: bool,
}

impl CorePlatform {
    /// Accepts requests whose `platform` field equals `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catch_all: false,
        }
    }

    /// Accepts every request.
    pub fn catch_all(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catch_all: true,
        }
    }

    fn data_holder() -> Node {
        Node::map().with("data", Node::map())
    }
}

impl Platform for CorePlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, request: &serde_json::Value) -> bool {
        self.catch_all
            || request
                .get("platform")
                .and_then(|p| p.as_str())
                .is_some_and(|p| p == self.name)
    }

    fn create_session(&self, ctx: &RequestContext) -> Result<Session, PipelineError> {
        let input = Node::map();
        if let Some(kind) = ctx.request.get("type").and_then(|t| t.as_str()) {
            input.set("type", Value::from(kind));
        }

        let root = Node::map()
            .with_tag(SESSION_TAG)
            .with(REQUEST_FIELD, Value::from_json(ctx.request.clone()))
            .with(RESPONSE_FIELD, Node::map())
            .with("$input", input)
            .with("$output", Node::list())
            .with("$session", Self::data_holder())
            .with("$user", Self::data_holder())
            .with("$data", Node::map())
            .with("$app", Value::Opaque("App".into()))
            .with("$platform", Value::Opaque(self.name.clone()))
            .with("$handleRequest", Value::Opaque("HandleRequest".into()));

        Ok(Arc::new(root))
    }
}
