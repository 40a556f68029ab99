//! Request and response emissions around the handler.

use serde_json::Value as Json;

use super::DebuggerError;
use crate::correlate::CorrelationId;
use crate::pipeline::{
    LifecycleHook, PipelineError, RequestContext, Session, REQUEST_FIELD, RESPONSE_FIELD,
};
use crate::transport::{ConnectionState, DebuggerPayload, OutboundEvent, SharedTransport};

/// Emits `app.request` before the handler and `app.response` after it.
///
/// Unlike update and log emission, these fail the request when there is no
/// live connection.
pub struct LifecycleEmitter {
    transport: SharedTransport,
}

impl LifecycleEmitter {
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    fn send(
        &self,
        ctx: &RequestContext,
        wrap: fn(DebuggerPayload<Json>) -> OutboundEvent,
        data: Json,
    ) -> Result<CorrelationId, DebuggerError> {
        let request_id = ctx.debugger_request_id.ok_or(DebuggerError::Uncorrelated)?;
        let transport = self.transport.get().ok_or(DebuggerError::NoTransport)?;
        let state = transport.state();
        if state != ConnectionState::Connected {
            return Err(DebuggerError::NotConnected(state));
        }
        transport.emit(wrap(DebuggerPayload { request_id, data }))?;
        Ok(request_id)
    }
}

impl LifecycleHook for LifecycleEmitter {
    fn on_request_start(&self, ctx: &RequestContext, session: &Session) -> Result<(), PipelineError> {
        let request_id = self.send(ctx, OutboundEvent::Request, session.get(REQUEST_FIELD).to_json())?;
        tracing::trace!(%request_id, "Emitted debugger request");
        Ok(())
    }

    fn on_response_end(&self, ctx: &RequestContext, session: &Session) -> Result<(), PipelineError> {
        let request_id =
            self.send(ctx, OutboundEvent::Response, session.get(RESPONSE_FIELD).to_json())?;
        tracing::trace!(%request_id, "Emitted debugger response");
        Ok(())
    }
}
