//! Request Replayer.
//!
//! A payload sent by the debugger is submitted to the app's normal entry
//! point as a synthetic request. It goes through correlation and observation
//! like any live request.

use serde_json::Value as Json;

use crate::pipeline::{App, InboundRequest, PipelineError};

/// Run `payload` through `app`. Pipeline errors are returned unchanged.
pub async fn replay(app: &App, payload: Json) -> Result<Json, PipelineError> {
    tracing::debug!("Replaying debugger request");
    app.handle(InboundRequest::Synthetic(payload)).await
}
