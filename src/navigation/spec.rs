//! Specs: per-route view configuration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::navigation::error::SpecLoadError;

/// A loaded spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spec {
    /// Filled in from the requested name when the document omits it.
    pub name: String,
    /// Settings overlaid on the router settings while the spec is active.
    pub settings: Value,
    /// Organizers to attach, with their own settings.
    pub organizers: IndexMap<String, Value>,
}

/// Where and how to load a spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecLoadOptions {
    pub base_path: String,
    /// Appended to remote requests, e.g. for cache busting.
    pub query: Option<String>,
}

/// Fetches specs by name.
#[async_trait]
pub trait SpecLoader: Send + Sync {
    async fn load(&self, name: &str, options: &SpecLoadOptions) -> Result<Spec, SpecLoadError>;
}

/// Reads `<base_path>/<name>.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSpecLoader;

impl FileSpecLoader {
    fn spec_path(name: &str, base_path: &str) -> Result<PathBuf, SpecLoadError> {
        let valid = !name.is_empty()
            && name != "."
            && !name.contains("..")
            && !name.contains(|c: char| c == '/' || c == '\\');
        if !valid {
            return Err(SpecLoadError::InvalidName(name.to_string()));
        }
        Ok(Path::new(base_path).join(format!("{}.json", name)))
    }
}

#[async_trait]
impl SpecLoader for FileSpecLoader {
    async fn load(&self, name: &str, options: &SpecLoadOptions) -> Result<Spec, SpecLoadError> {
        let path = Self::spec_path(name, &options.base_path)?;
        tracing::debug!(spec = %name, path = ?path, "Loading spec file");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SpecLoadError::NotFound(name.to_string()))
            }
            Err(source) => return Err(SpecLoadError::Io { path, source }),
        };

        let mut spec: Spec =
            serde_json::from_str(&content).map_err(|source| SpecLoadError::Parse { path: path.clone(), source })?;
        if spec.name.is_empty() {
            spec.name = name.to_string();
        }
        tracing::debug!(spec = %name, path = ?path, "Loaded spec file");
        Ok(spec)
    }
}
