use std::sync::Arc;

use super::initial_sweep;
use crate::observe::Observer;
use crate::pipeline::{Platform, PipelineError, RequestContext, Session};

/// Platform decorator that hands out observed sessions.
///
/// The inner platform builds the graph as usual; this wrapper sweeps its
/// initial state to the observer and returns it wrapped.
pub struct ObservingPlatform {
    inner: Arc<dyn Platform>,
    observer: Observer,
}

impl ObservingPlatform {
    pub fn new(inner: Arc<dyn Platform>, observer: Observer) -> Self {
        Self { inner, observer }
    }

    pub fn inner(&self) -> &Arc<dyn Platform> {
        &self.inner
    }
}

impl Platform for ObservingPlatform {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports(&self, request: &serde_json::Value) -> bool {
        self.inner.supports(request)
    }

    fn create_session(&self, ctx: &RequestContext) -> Result<Session, PipelineError> {
        let request_id = ctx.debugger_request_id.ok_or_else(|| {
            PipelineError::Setup("request was not assigned a debugger request id".to_string())
        })?;

        let session = self.inner.create_session(ctx)?;
        initial_sweep(
            session.as_ref(),
            request_id,
            self.observer.policy(),
            self.observer.emitter(),
        );
        Ok(self.observer.wrap(session, request_id, ""))
    }
}
