//! Scene loading and engine configuration
//!
//! This crate turns raw bytes into a validated [`SceneDocument`] and loads
//! the engine's YAML configuration file.
//!
//! Scene documents may be JSON (the dashboard's native format) or YAML,
//! chosen by file extension. Loading fails as a whole on the first problem:
//!
//! - bytes that do not parse, or do not have the scene structure
//! - a `formatVersion` other than the configured literal
//! - duplicate action ids
//! - unresolved `waitFor` references, when the policy is `reject`
//!
//! # Example
//!
//! ```ignore
//! use scene_config::{EngineConfig, SceneLoader};
//!
//! let config = EngineConfig::load("engine.yaml")?;
//! let document = SceneLoader::from_config(&config).load_file("scenes/demo.json")?;
//! ```

mod engine_config;
mod error;
mod loader;

pub use engine_config::{EngineConfig, SiblingFailurePolicy, UnresolvedDependencyPolicy};
pub use error::{SceneLoadError, SceneLoadResult};
pub use loader::{SceneFormat, SceneLoader};

// Re-export the document type for convenience
pub use scene_core::SceneDocument;
