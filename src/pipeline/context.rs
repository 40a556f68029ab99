use crate::correlate::CorrelationId;

/// How a request entered the pipeline. Both variants are handled identically.
#[derive(Debug, Clone)]
pub enum InboundRequest {
    /// Organic traffic from a platform webhook.
    Live(serde_json::Value),
    /// A payload injected by the remote debugger.
    Synthetic(serde_json::Value),
}

impl InboundRequest {
    pub fn payload(&self) -> &serde_json::Value {
        match self {
            InboundRequest::Live(payload) | InboundRequest::Synthetic(payload) => payload,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, InboundRequest::Synthetic(_))
    }

    pub fn into_payload(self) -> serde_json::Value {
        match self {
            InboundRequest::Live(payload) | InboundRequest::Synthetic(payload) => payload,
        }
    }
}

/// Per-request processing context, created before any session object.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Raw request payload.
    pub request: serde_json::Value,
    /// Name of the platform that accepted the request.
    pub platform: Option<String>,
    /// Set by the request correlator during setup.
    pub debugger_request_id: Option<CorrelationId>,
}

impl RequestContext {
    pub fn new(request: serde_json::Value) -> Self {
        Self {
            request,
            platform: None,
            debugger_request_id: None,
        }
    }
}
