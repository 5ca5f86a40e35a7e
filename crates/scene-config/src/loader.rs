//! Scene document loader
//!
//! Parsing happens in three steps, each of which can reject the document:
//! the raw bytes are decoded into a generic value, the format version is
//! checked against the supported literal, and only then is the value mapped
//! onto [`SceneDocument`] and validated.

use crate::engine_config::{EngineConfig, UnresolvedDependencyPolicy};
use crate::error::{SceneLoadError, SceneLoadResult};
use scene_core::SceneDocument;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Encoding of a scene file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneFormat {
    #[default]
    Json,
    Yaml,
}

impl SceneFormat {
    /// Pick the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Loads and validates scene documents
#[derive(Debug, Clone)]
pub struct SceneLoader {
    /// Accepted `metadata.formatVersion`
    format_version: String,
    /// How unresolved `waitFor` references are treated
    unresolved_dependency: UnresolvedDependencyPolicy,
}

impl SceneLoader {
    /// Loader accepting `format_version` that rejects unresolved references
    pub fn new(format_version: impl Into<String>) -> Self {
        Self {
            format_version: format_version.into(),
            unresolved_dependency: UnresolvedDependencyPolicy::Reject,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            format_version: config.format_version.clone(),
            unresolved_dependency: config.unresolved_dependency,
        }
    }

    pub fn format_version(&self) -> &str {
        &self.format_version
    }

    /// Read and load a scene file
    pub fn load_file(&self, path: impl AsRef<Path>) -> SceneLoadResult<SceneDocument> {
        let path = path.as_ref();
        debug!("Loading scene file: {:?}", path);

        let bytes = fs::read(path).map_err(|e| SceneLoadError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.load_bytes(&bytes, SceneFormat::from_path(path))
    }

    /// Load a scene from raw bytes
    pub fn load_bytes(&self, bytes: &[u8], format: SceneFormat) -> SceneLoadResult<SceneDocument> {
        let value: Value = match format {
            SceneFormat::Json => serde_json::from_slice(bytes)
                .map_err(|e| SceneLoadError::ParseJson { source: e })?,
            SceneFormat::Yaml => serde_yaml::from_slice(bytes)
                .map_err(|e| SceneLoadError::ParseYaml { source: e })?,
        };

        self.load_value(value)
    }

    /// Load a JSON scene from a string
    pub fn load_str(&self, content: &str) -> SceneLoadResult<SceneDocument> {
        self.load_bytes(content.as_bytes(), SceneFormat::Json)
    }

    /// Check the version, map the value onto a document and validate it
    pub fn load_value(&self, value: Value) -> SceneLoadResult<SceneDocument> {
        // A wrong version is reported even if the rest of the document has a
        // shape this version does not understand. A missing or non-string
        // version is a wrong version too.
        match value.get("metadata").and_then(|m| m.get("formatVersion")) {
            Some(Value::String(found)) => self.check_version(found)?,
            other => {
                return Err(SceneLoadError::UnsupportedVersion {
                    found: other.map_or_else(|| "null".to_string(), Value::to_string),
                    expected: self.format_version.clone(),
                });
            }
        }

        let document: SceneDocument =
            serde_json::from_value(value).map_err(|e| SceneLoadError::Structure { source: e })?;

        self.validate(&document)?;

        debug!(
            scene = %document.name(),
            groups = document.groups.len(),
            actions = document.action_count(),
            "Scene loaded"
        );

        Ok(document)
    }

    /// Validate an already-built document
    ///
    /// Rejects a wrong format version, duplicate action ids, and unresolved
    /// `waitFor` references when the policy is
    /// [`UnresolvedDependencyPolicy::Reject`].
    pub fn validate(&self, document: &SceneDocument) -> SceneLoadResult<()> {
        self.check_version(&document.metadata.format_version)?;

        if let Some(id) = document.duplicate_ids().into_iter().next() {
            return Err(SceneLoadError::DuplicateActionId { id });
        }

        let unresolved = document.unresolved_dependencies();
        for dependency in &unresolved {
            trace!(
                id = %dependency.id,
                wait_for = %dependency.wait_for,
                chain = %dependency.chain,
                group = dependency.group,
                "Unresolved dependency"
            );
        }

        if let Some(first) = unresolved.first() {
            match self.unresolved_dependency {
                UnresolvedDependencyPolicy::Reject => {
                    return Err(SceneLoadError::UnresolvedDependency {
                        id: first.id,
                        wait_for: first.wait_for,
                    });
                }
                policy => {
                    warn!(
                        count = unresolved.len(),
                        ?policy,
                        "Scene has unresolved waitFor references"
                    );
                }
            }
        }

        Ok(())
    }

    fn check_version(&self, found: &str) -> SceneLoadResult<()> {
        if found != self.format_version {
            return Err(SceneLoadError::UnsupportedVersion {
                found: found.to_string(),
                expected: self.format_version.clone(),
            });
        }
        Ok(())
    }
}

impl Default for SceneLoader {
    fn default() -> Self {
        Self::new(scene_core::FORMAT_VERSION)
    }
}
