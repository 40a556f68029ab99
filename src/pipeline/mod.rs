//! Request-handling pipeline.
//!
//! This is the seam the debugger plugs into: request setup hooks run before a
//! session exists, a [`Platform`] turns the request into a session graph,
//! lifecycle hooks bracket the [`RequestHandler`].

mod context;
mod platform;

use std::sync::Arc;

use async_trait::async_trait;

pub use context::{InboundRequest, RequestContext};
pub use platform::CorePlatform;

use crate::observe::ObservableContainer;

/// Session graph handed to handlers and hooks.
pub type Session = Arc<dyn ObservableContainer>;

/// Field holding the request inside a session graph.
pub const REQUEST_FIELD: &str = "$request";
/// Field holding the response inside a session graph.
pub const RESPONSE_FIELD: &str = "$response";

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No installed platform accepted the request.
    #[error("No platform supports this request")]
    NoPlatform,

    /// A setup step failed before the session was created.
    #[error("Request setup failed: {0}")]
    Setup(String),

    /// A lifecycle hook failed.
    #[error("Lifecycle hook failed: {0}")]
    Hook(String),

    /// The application handler failed.
    #[error("Handler failed: {0}")]
    Handler(String),
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Handler(err.to_string())
    }
}

/// Runs against the request context before any session object is built.
pub trait RequestSetup: Send + Sync {
    fn prepare(&self, ctx: &mut RequestContext) -> Result<(), PipelineError>;
}

/// Produces the session graph for a request.
pub trait Platform: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, request: &serde_json::Value) -> bool;

    fn create_session(&self, ctx: &RequestContext) -> Result<Session, PipelineError>;
}

/// Application logic.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, ctx: &RequestContext, session: &Session) -> Result<(), PipelineError>;
}

/// Hooks around the handler. Both default to no-ops.
pub trait LifecycleHook: Send + Sync {
    fn on_request_start(
        &self,
        _ctx: &RequestContext,
        _session: &Session,
    ) -> Result<(), PipelineError> {
        Ok(())
    }

    fn on_response_end(
        &self,
        _ctx: &RequestContext,
        _session: &Session,
    ) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Assembled application. Immutable once built.
pub struct App {
    platforms: Vec<Arc<dyn Platform>>,
    setups: Vec<Arc<dyn RequestSetup>>,
    hooks: Vec<Arc<dyn LifecycleHook>>,
    handler: Arc<dyn RequestHandler>,
}

impl App {
    pub fn builder(handler: Arc<dyn RequestHandler>) -> AppBuilder {
        AppBuilder {
            platforms: Vec::new(),
            setups: Vec::new(),
            hooks: Vec::new(),
            handler,
        }
    }

    pub fn platforms(&self) -> &[Arc<dyn Platform>] {
        &self.platforms
    }

    /// Single entry point for every request, live or synthetic.
    ///
    /// Returns the materialized `$response` field.
    pub async fn handle(&self, inbound: InboundRequest) -> Result<serde_json::Value, PipelineError> {
        let synthetic = inbound.is_synthetic();
        let mut ctx = RequestContext::new(inbound.into_payload());

        for setup in &self.setups {
            setup.prepare(&mut ctx)?;
        }

        let platform = self
            .platforms
            .iter()
            .find(|platform| platform.supports(&ctx.request))
            .ok_or(PipelineError::NoPlatform)?;
        ctx.platform = Some(platform.name().to_string());

        tracing::debug!(
            platform = %platform.name(),
            synthetic,
            request_id = ?ctx.debugger_request_id,
            "Handling request"
        );

        let session = platform.create_session(&ctx)?;

        for hook in &self.hooks {
            hook.on_request_start(&ctx, &session)?;
        }

        self.handler.handle(&ctx, &session).await?;

        for hook in &self.hooks {
            hook.on_response_end(&ctx, &session)?;
        }

        Ok(session.get(RESPONSE_FIELD).to_json())
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    platforms: Vec<Arc<dyn Platform>>,
    setups: Vec<Arc<dyn RequestSetup>>,
    hooks: Vec<Arc<dyn LifecycleHook>>,
    handler: Arc<dyn RequestHandler>,
}

impl AppBuilder {
    pub fn with_platform(mut self, platform: Arc<dyn Platform>) -> Self {
        self.platforms.push(platform);
        self
    }

    pub fn use_platform(&mut self, platform: Arc<dyn Platform>) {
        self.platforms.push(platform);
    }

    pub fn use_setup(&mut self, setup: Arc<dyn RequestSetup>) {
        self.setups.push(setup);
    }

    pub fn use_hook(&mut self, hook: Arc<dyn LifecycleHook>) {
        self.hooks.push(hook);
    }

    /// Replace every installed platform with a decorated one.
    pub fn decorate_platforms<F>(&mut self, mut decorate: F)
    where
        F: FnMut(Arc<dyn Platform>) -> Arc<dyn Platform>,
    {
        self.platforms = std::mem::take(&mut self.platforms)
            .into_iter()
            .map(&mut decorate)
            .collect();
    }

    pub fn build(self) -> App {
        App {
            platforms: self.platforms,
            setups: self.setups,
            hooks: self.hooks,
            handler: self.handler,
        }
    }
}
