//! The debugger plugin.
//!
//! [`Debugger::install`] wires correlation, observation and lifecycle
//! emission into an app under construction. [`Debugger::initialize`] connects
//! to the debugger service and starts reacting to its commands.

mod error;
mod lifecycle;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub use error::DebuggerError;
pub use lifecycle::LifecycleEmitter;

use crate::assets::AssetLoader;
use crate::config::{resolve_webhook_id, DebuggerConfig, IdentityError};
use crate::correlate::{ObservingPlatform, RequestCorrelator};
use crate::logs::LogInterceptor;
use crate::observe::{Observer, UpdateEmitter};
use crate::pipeline::{App, AppBuilder, CorePlatform, Platform};
use crate::replay::replay;
use crate::transport::{
    CommandHandler, InboundCommand, OutboundEvent, SharedTransport, Transport, TransportSession,
    WebSocketTransport,
};
use crate::util::paths::{home_dir, resolve_from_cwd};

/// Name of the platform the debugger adds for its own requests.
pub const DEBUGGER_PLATFORM: &str = "jovo-debugger";

pub struct Debugger {
    config: DebuggerConfig,
    transport: SharedTransport,
    interceptor: LogInterceptor,
    observer: Observer,
}

impl Debugger {
    pub fn new(config: DebuggerConfig, interceptor: LogInterceptor) -> Self {
        let transport = SharedTransport::default();
        let observer = Observer::new(
            Arc::new(config.observe_policy()),
            UpdateEmitter::new(transport.clone()),
        );
        Self {
            config,
            transport,
            interceptor,
            observer,
        }
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.transport
    }

    pub fn interceptor(&self) -> &LogInterceptor {
        &self.interceptor
    }

    /// Install into an app under construction. Call after the app's own
    /// platforms are registered: every platform present is decorated.
    ///
    /// Does nothing when the debugger is disabled.
    pub fn install(&self, builder: &mut AppBuilder) {
        if !self.config.enabled {
            tracing::debug!("Debugger disabled, not installing");
            return;
        }

        builder.use_platform(Arc::new(CorePlatform::new(DEBUGGER_PLATFORM)));
        let observer = self.observer.clone();
        builder.decorate_platforms(|platform| -> Arc<dyn Platform> {
            Arc::new(ObservingPlatform::new(platform, observer.clone()))
        });
        builder.use_setup(Arc::new(RequestCorrelator));
        builder.use_hook(Arc::new(LifecycleEmitter::new(self.transport.clone())));
        tracing::debug!("Debugger installed");
    }

    /// Resolve the webhook id, connect and start dispatching commands.
    ///
    /// A failure here means debugging cannot work at all; callers should
    /// treat it as fatal.
    pub async fn initialize(self: &Arc<Self>, app: Arc<App>) -> Result<TransportSession, DebuggerError> {
        if !self.config.enabled {
            return Err(DebuggerError::Disabled);
        }

        let home = home_dir().ok_or(IdentityError::NoHome)?;
        self.initialize_from_home(app, &home).await
    }

    /// Like [`Debugger::initialize`], reading the identity token from the
    /// user config below `home`. Nothing is connected if the token cannot be
    /// resolved.
    pub async fn initialize_from_home(
        self: &Arc<Self>,
        app: Arc<App>,
        home: &Path,
    ) -> Result<TransportSession, DebuggerError> {
        if !self.config.enabled {
            return Err(DebuggerError::Disabled);
        }

        let webhook_id = resolve_webhook_id(home).await?;
        let (transport, commands) =
            WebSocketTransport::connect(&self.config.webhook_url, &webhook_id).await?;
        self.attach(app, transport, commands)
    }

    /// Attach an already connected transport and start dispatching.
    pub fn attach(
        self: &Arc<Self>,
        app: Arc<App>,
        transport: Arc<dyn Transport>,
        commands: mpsc::UnboundedReceiver<InboundCommand>,
    ) -> Result<TransportSession, DebuggerError> {
        if !self.transport.attach(transport.clone()) {
            return Err(DebuggerError::AlreadyAttached);
        }
        let handler = Arc::new(DebuggerCommands {
            debugger: self.clone(),
            app,
        });
        Ok(TransportSession::start(transport, commands, handler))
    }

    /// Forward process output from now on. Repeated calls are no-ops.
    pub fn on_debugging_available(&self) {
        let Some(transport) = self.transport.get() else {
            tracing::warn!("Debugging available but no transport attached");
            return;
        };
        if self.interceptor.arm(transport) {
            tracing::info!("Debugging available, forwarding console output");
        }
    }

    /// Send the language model snapshot.
    ///
    /// Skipped when disabled or unconfigured. Load failures are logged.
    pub async fn send_language_model(&self) -> Result<(), DebuggerError> {
        if !self.config.language_model_enabled {
            return Ok(());
        }
        let (Some(models_path), Some(_)) = (
            self.config.language_model_path.as_ref(),
            self.config.debugger_json_path.as_ref(),
        ) else {
            tracing::debug!("Language model path not configured, skipping");
            return Ok(());
        };
        let Some(transport) = self.transport.get() else {
            tracing::warn!("Cannot emit language model: no transport attached");
            return Ok(());
        };

        let dir = resolve_from_cwd(models_path);
        let models = match AssetLoader::new()?.load(&dir).await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot emit language model");
                return Ok(());
            }
        };

        tracing::debug!(locales = models.len(), "Sending language model");
        transport.emit(OutboundEvent::LanguageModel(models))?;
        Ok(())
    }
}

/// Routes inbound commands to the debugger.
struct DebuggerCommands {
    debugger: Arc<Debugger>,
    app: Arc<App>,
}

#[async_trait]
impl CommandHandler for DebuggerCommands {
    async fn handle(&self, command: InboundCommand) -> anyhow::Result<()> {
        match command {
            InboundCommand::DebuggingAvailable => self.debugger.on_debugging_available(),
            InboundCommand::DebuggingUnavailable => {
                tracing::info!("Debugger reported debugging unavailable");
            }
            InboundCommand::LanguageModelRequest => self.debugger.send_language_model().await?,
            InboundCommand::DebuggerRequest(payload) => {
                replay(&self.app, payload)
                    .await
                    .map_err(DebuggerError::Replay)?;
            }
        }
        Ok(())
    }
}
