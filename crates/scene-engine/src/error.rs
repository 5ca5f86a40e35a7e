//! Engine errors

use scene_config::SceneLoadError;
use scene_core::ActionId;
use thiserror::Error;

/// Errors that end a scene run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load scene: {0}")]
    Load(#[from] SceneLoadError),

    #[error("action {id} waits for unknown action {wait_for}")]
    UnresolvedDependency { id: ActionId, wait_for: ActionId },

    #[error("group {group} failed: actions {failed:?} did not complete")]
    GroupFailed { group: usize, failed: Vec<ActionId> },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
