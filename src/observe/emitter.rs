//! Update Emitter: shapes an observed mutation into an `app.jovo-update`
//! event and hands it to the transport.

use crate::correlate::CorrelationId;
use crate::transport::{
    DebuggerPayload, OutboundEvent, SharedTransport, Transport, TransportError, UpdateData,
};

/// Send a single update event. No buffering; each call is one message.
pub fn emit_update(
    transport: &dyn Transport,
    request_id: CorrelationId,
    key: &str,
    value: serde_json::Value,
    path: String,
) -> Result<(), TransportError> {
    transport.emit(OutboundEvent::Update(DebuggerPayload {
        request_id,
        data: UpdateData {
            key: key.to_string(),
            value,
            path,
        },
    }))
}

/// Emitter bound to the process-wide transport slot.
///
/// Emission without a live connection is a silent no-op.
#[derive(Clone, Default)]
pub struct UpdateEmitter {
    transport: SharedTransport,
}

impl UpdateEmitter {
    pub fn new(transport: SharedTransport) -> Self {
        Self { transport }
    }

    pub fn emit(
        &self,
        request_id: CorrelationId,
        key: &str,
        value: serde_json::Value,
        path: String,
    ) {
        let Some(transport) = self.transport.get() else {
            tracing::trace!(%request_id, %path, "No debugger transport, dropping update");
            return;
        };
        match emit_update(transport.as_ref(), request_id, key, value, path) {
            Ok(()) => {}
            Err(TransportError::NotConnected) => {
                tracing::trace!(%request_id, "Debugger transport not connected, dropping update");
            }
            Err(error) => {
                tracing::warn!(%request_id, error = %error, "Failed to emit debugger update");
            }
        }
    }
}
