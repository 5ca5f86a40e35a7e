//! Engine configuration
//!
//! Loaded from a YAML file; every key is optional.
//!
//! ```yaml
//! format_version: "0.0.1"
//! unresolved_dependency: reject   # reject | run_after_chain_tail | ignore
//! sibling_failure: run_to_completion  # run_to_completion | cancel
//! continue_on_group_failure: false
//! action_timeout_ms: 30000
//! ```

use crate::error::{SceneLoadError, SceneLoadResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// What to do with a `waitFor` that does not resolve during wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedDependencyPolicy {
    /// Reject the whole document at load time
    #[default]
    Reject,
    /// Warn, then run the action after its chain's current tail
    RunAfterChainTail,
    /// Warn and never run the action; its id aliases the chain tail
    Ignore,
}

/// What happens to the rest of a group when one of its actions fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiblingFailurePolicy {
    /// Sibling chains keep running; the group settles once all of them do
    #[default]
    RunToCompletion,
    /// Abort every unsettled action of the group
    Cancel,
}

/// Scene engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The only accepted `metadata.formatVersion`
    pub format_version: String,

    pub unresolved_dependency: UnresolvedDependencyPolicy,

    pub sibling_failure: SiblingFailurePolicy,

    /// Execute later groups even after a group failed
    pub continue_on_group_failure: bool,

    /// Fail an invocation that has not settled after this many milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            format_version: scene_core::FORMAT_VERSION.to_string(),
            unresolved_dependency: UnresolvedDependencyPolicy::default(),
            sibling_failure: SiblingFailurePolicy::default(),
            continue_on_group_failure: false,
            action_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    /// Load from a YAML file; an empty file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> SceneLoadResult<Self> {
        let path = path.as_ref();
        debug!("Loading engine config: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| SceneLoadError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| SceneLoadError::InvalidConfig {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_ms.map(Duration::from_millis)
    }
}
