//! Scene actions and their execution states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an action, unique across a whole scene document
///
/// Other actions reference it through `waitFor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub i64);

impl ActionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ActionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// One executable step of a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAction {
    /// Document-unique identifier
    pub id: ActionId,

    /// Name of the operation, resolved by the action invoker
    pub action: String,

    /// Arbitrary data handed to the invoker
    #[serde(default)]
    pub payload: serde_json::Value,

    /// Run only after this action settles instead of after the chain predecessor
    #[serde(
        default,
        rename = "waitFor",
        alias = "wait_for",
        skip_serializing_if = "Option::is_none"
    )]
    pub wait_for: Option<ActionId>,

    /// Logged immediately before execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl SceneAction {
    pub fn new(id: i64, action: impl Into<String>) -> Self {
        Self {
            id: ActionId(id),
            action: action.into(),
            payload: serde_json::Value::Null,
            wait_for: None,
            comment: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_wait_for(mut self, wait_for: i64) -> Self {
        self.wait_for = Some(ActionId(wait_for));
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Execution state of an action node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    /// Wired, waiting for its predecessor
    #[default]
    Pending,
    /// Invocation in flight
    Running,
    /// Invocation succeeded
    Done,
    /// Invocation failed
    Failed,
    /// Never invoked (failed predecessor, cancellation, or ignored dependency)
    Skipped,
}

impl ActionState {
    /// Whether the state will never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
