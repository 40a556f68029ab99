//! Asset Snapshot Loader.
//!
//! Scans a language model directory and returns one entry per locale, keyed by
//! the file name in front of the asset suffix (`en.json` -> `en`). JSON files
//! are parsed; script files go through a [`ModuleLoader`].

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value as Json;
use thiserror::Error;

/// File names recognized as assets. The capture group is the suffix.
pub const ASSET_FILE_PATTERN: &str = r"^.*([.]js(?:on)?)$";

const JSON_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Cannot read asset directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read asset file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to load module {}: {message}", path.display())]
    Module { path: PathBuf, message: String },

    #[error("Invalid asset pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Loads script assets into a JSON value.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Json, AssetError>;
}

/// Default module loader: the module's value is its source text.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceModuleLoader;

#[async_trait]
impl ModuleLoader for SourceModuleLoader {
    async fn load(&self, path: &Path) -> Result<Json, AssetError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AssetError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Json::String(source))
    }
}

pub struct AssetLoader {
    pattern: Regex,
    modules: Arc<dyn ModuleLoader>,
}

impl AssetLoader {
    pub fn new() -> Result<Self, AssetError> {
        Ok(Self {
            pattern: Regex::new(ASSET_FILE_PATTERN)?,
            modules: Arc::new(SourceModuleLoader),
        })
    }

    pub fn with_module_loader(mut self, modules: Arc<dyn ModuleLoader>) -> Self {
        self.modules = modules;
        self
    }

    /// Split a file name into `(locale, suffix)` if it is an asset.
    ///
    /// The locale ends at the first occurrence of the matched suffix, so
    /// `a.json.js` is the `.js` asset for locale `a`.
    pub fn classify<'a>(&self, file_name: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.pattern.captures(file_name)?;
        let suffix = captures.get(1)?.as_str();
        let at = file_name.find(suffix)?;
        Some((&file_name[..at], suffix))
    }

    /// Load every asset in `dir`.
    ///
    /// An unreadable directory is an error. A file that fails to read or
    /// parse is logged and its locale skipped. Files are visited in name
    /// order, so a later file wins when two map to the same locale.
    pub async fn load(&self, dir: &Path) -> Result<BTreeMap<String, Json>, AssetError> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|source| AssetError::ReadDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut names = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    if let Ok(name) = entry.file_name().into_string() {
                        names.push(name);
                    }
                }
                Ok(None) => break,
                Err(source) => {
                    return Err(AssetError::ReadDir {
                        path: dir.to_path_buf(),
                        source,
                    })
                }
            }
        }
        names.sort();

        let mut models = BTreeMap::new();
        for name in &names {
            let Some((locale, suffix)) = self.classify(name) else {
                continue;
            };
            let path = dir.join(name);
            let loaded = if suffix == JSON_SUFFIX {
                read_json(&path).await
            } else {
                self.modules.load(&path).await
            };
            match loaded {
                Ok(value) => {
                    models.insert(locale.to_string(), value);
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Skipping language model");
                }
            }
        }

        tracing::debug!(dir = %dir.display(), count = models.len(), "Loaded language models");
        Ok(models)
    }
}

async fn read_json(path: &Path) -> Result<Json, AssetError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AssetError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&contents).map_err(|source| AssetError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
