use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;
use crate::observe::{ObservePolicy, DEFAULT_IGNORED_PROPERTIES, DEFAULT_IGNORED_TYPES};

/// Default debugger service endpoint
pub const DEFAULT_WEBHOOK_URL: &str = "wss://webhookv4.jovo.cloud";

/// Config file read from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "debug-bridge.toml";

/// Launch flags that turn the debugger on
pub const ENABLE_FLAGS: &[&str] = &["--jovo-webhook", "--webhook"];

/// Launch flag that wins over the enable flags
pub const DISABLE_FLAG: &str = "--disable-jovo-debugger";

/// Debugger configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DebuggerConfig {
    /// Whether the debugger connects at all
    pub enabled: bool,
    /// Debugger service endpoint
    pub webhook_url: String,
    /// Answer language model requests
    pub language_model_enabled: bool,
    /// Directory holding one language model file per locale
    pub language_model_path: Option<PathBuf>,
    /// Debugger layout file. Only checked for presence of the setting.
    pub debugger_json_path: Option<PathBuf>,
    /// Session fields that are never observed
    pub ignored_properties: Vec<String>,
    /// Node type tags that are never wrapped
    pub ignored_types: Vec<String>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            enabled: enabled_from_args(std::env::args()),
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            language_model_enabled: true,
            language_model_path: Some(PathBuf::from("./models")),
            debugger_json_path: Some(PathBuf::from("./debugger.json")),
            ignored_properties: DEFAULT_IGNORED_PROPERTIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_types: DEFAULT_IGNORED_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// TOML representation of the `[debugger]` table. Every key is optional.
///
/// An empty string for a path key unsets it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlDebuggerConfig {
    pub enabled: Option<bool>,
    pub webhook_url: Option<String>,
    pub language_model_enabled: Option<bool>,
    pub language_model_path: Option<PathBuf>,
    pub debugger_json_path: Option<PathBuf>,
    pub ignored_properties: Option<Vec<String>>,
    pub ignored_types: Option<Vec<String>>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub debugger: Option<TomlDebuggerConfig>,
}

fn non_empty(path: PathBuf) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}

/// Whether the launch arguments ask for the debugger.
pub fn enabled_from_args<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut requested = false;
    for arg in args {
        let arg = arg.as_ref();
        if arg == DISABLE_FLAG {
            return false;
        }
        if ENABLE_FLAGS.contains(&arg) {
            requested = true;
        }
    }
    requested
}

impl DebuggerConfig {
    /// Load configuration from `path`, merging it over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`DebuggerConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Self::default();
        if let Some(debugger) = toml_config.debugger {
            config.merge(debugger);
        }
        Ok(config)
    }

    /// Overlay the keys present in `toml` on this config.
    pub fn merge(&mut self, toml: TomlDebuggerConfig) {
        if let Some(enabled) = toml.enabled {
            self.enabled = enabled;
        }
        if let Some(url) = toml.webhook_url {
            self.webhook_url = url;
        }
        if let Some(enabled) = toml.language_model_enabled {
            self.language_model_enabled = enabled;
        }
        if let Some(path) = toml.language_model_path {
            self.language_model_path = non_empty(path);
        }
        if let Some(path) = toml.debugger_json_path {
            self.debugger_json_path = non_empty(path);
        }
        if let Some(properties) = toml.ignored_properties {
            self.ignored_properties = properties;
        }
        if let Some(types) = toml.ignored_types {
            self.ignored_types = types;
        }
    }

    /// Apply the launch flags. Only ever turns the debugger off or on when a
    /// flag is present.
    pub fn apply_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        if args.iter().any(|a| a == DISABLE_FLAG) {
            self.enabled = false;
        } else if enabled_from_args(&args) {
            self.enabled = true;
        }
    }

    pub fn observe_policy(&self) -> ObservePolicy {
        ObservePolicy::new(
            self.ignored_properties.iter().cloned(),
            self.ignored_types.iter().cloned(),
        )
    }
}
