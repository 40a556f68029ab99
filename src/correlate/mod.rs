//! Request correlation.
//!
//! Every inbound request is stamped with a [`CorrelationId`] during setup,
//! before its session graph exists, so the observing platform can tag every
//! update from that graph.

mod platform;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use platform::ObservingPlatform;

use crate::observe::{ObservableContainer, ObservePolicy, UpdateEmitter};
use crate::pipeline::{PipelineError, RequestContext, RequestSetup};

/// Unique token tying together every event of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Setup step that assigns the correlation id.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestCorrelator;

impl RequestSetup for RequestCorrelator {
    fn prepare(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if let Some(existing) = ctx.debugger_request_id {
            tracing::debug!(request_id = %existing, "Request already correlated");
            return Ok(());
        }
        let id = CorrelationId::new();
        ctx.debugger_request_id = Some(id);
        tracing::trace!(request_id = %id, "Assigned debugger request id");
        Ok(())
    }
}

/// Emit one update per populated top-level field so the observer starts from
/// the full state rather than only later diffs.
///
/// Skips excluded fields, falsy scalars and empty composites.
pub fn initial_sweep(
    session: &dyn ObservableContainer,
    request_id: CorrelationId,
    policy: &ObservePolicy,
    emitter: &UpdateEmitter,
) {
    let root = session.target();
    for key in root.keys() {
        if policy.ignores_property(&key) {
            continue;
        }
        let Some(value) = root.get(&key) else {
            continue;
        };
        if value.is_falsy() || value.is_empty_composite() {
            continue;
        }
        emitter.emit(request_id, &key, value.to_json(), key.clone());
    }
}
