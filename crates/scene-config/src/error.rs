//! Error types for scene and configuration loading

use scene_core::ActionId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for loading operations
pub type SceneLoadResult<T> = Result<T, SceneLoadError>;

/// Errors that can occur while loading a scene or the engine configuration
#[derive(Debug, Error)]
pub enum SceneLoadError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes are not well-formed JSON
    #[error("failed to parse scene JSON: {source}")]
    ParseJson {
        #[source]
        source: serde_json::Error,
    },

    /// Bytes are not well-formed YAML
    #[error("failed to parse scene YAML: {source}")]
    ParseYaml {
        #[source]
        source: serde_yaml::Error,
    },

    /// Well-formed data without the scene structure
    #[error("invalid scene structure: {source}")]
    Structure {
        #[source]
        source: serde_json::Error,
    },

    /// Format version is not the supported literal
    #[error("unsupported scene format version '{found}', expected '{expected}'")]
    UnsupportedVersion { found: String, expected: String },

    /// The same action id is declared more than once
    #[error("duplicate action id {id}")]
    DuplicateActionId { id: ActionId },

    /// A waitFor points at no action wired before it
    #[error("action {id} waits for unknown action {wait_for}")]
    UnresolvedDependency { id: ActionId, wait_for: ActionId },

    /// Engine configuration file is invalid
    #[error("invalid engine configuration in {path}: {source}")]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl SceneLoadError {
    /// Whether the bytes could not be read as a scene at all
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::ParseJson { .. } | Self::ParseYaml { .. } | Self::Structure { .. }
        )
    }

    pub fn is_version_error(&self) -> bool {
        matches!(self, Self::UnsupportedVersion { .. })
    }
}
