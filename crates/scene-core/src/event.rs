//! Progress events emitted while a scene runs

use crate::action::ActionId;
use crate::context::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a [`SceneEventData`], used to subscribe to one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneEventKind {
    RunStarted,
    RunRejected,
    GroupStarted,
    ActionStarted,
    ActionSucceeded,
    ActionFailed,
    ActionSkipped,
    DependencyNotFound,
    GroupFinished,
    RunFinished,
}

impl SceneEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::RunRejected => "run_rejected",
            Self::GroupStarted => "group_started",
            Self::ActionStarted => "action_started",
            Self::ActionSucceeded => "action_succeeded",
            Self::ActionFailed => "action_failed",
            Self::ActionSkipped => "action_skipped",
            Self::DependencyNotFound => "dependency_not_found",
            Self::GroupFinished => "group_finished",
            Self::RunFinished => "run_finished",
        }
    }
}

impl fmt::Display for SceneEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SceneEventData {
    RunStarted {
        source: String,
    },
    RunRejected {
        source: String,
    },
    GroupStarted {
        group: usize,
        chains: usize,
    },
    ActionStarted {
        id: ActionId,
        action: String,
        chain: String,
        group: usize,
    },
    ActionSucceeded {
        id: ActionId,
    },
    ActionFailed {
        id: ActionId,
        error: String,
    },
    ActionSkipped {
        id: ActionId,
        reason: String,
    },
    DependencyNotFound {
        id: ActionId,
        wait_for: ActionId,
    },
    GroupFinished {
        group: usize,
        success: bool,
    },
    RunFinished {
        status: String,
    },
}

impl SceneEventData {
    pub fn kind(&self) -> SceneEventKind {
        match self {
            Self::RunStarted { .. } => SceneEventKind::RunStarted,
            Self::RunRejected { .. } => SceneEventKind::RunRejected,
            Self::GroupStarted { .. } => SceneEventKind::GroupStarted,
            Self::ActionStarted { .. } => SceneEventKind::ActionStarted,
            Self::ActionSucceeded { .. } => SceneEventKind::ActionSucceeded,
            Self::ActionFailed { .. } => SceneEventKind::ActionFailed,
            Self::ActionSkipped { .. } => SceneEventKind::ActionSkipped,
            Self::DependencyNotFound { .. } => SceneEventKind::DependencyNotFound,
            Self::GroupFinished { .. } => SceneEventKind::GroupFinished,
            Self::RunFinished { .. } => SceneEventKind::RunFinished,
        }
    }
}

/// An event fired on the scene event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEvent {
    #[serde(flatten)]
    pub data: SceneEventData,

    /// Context of the run that produced the event
    pub context: Context,

    pub time_fired: DateTime<Utc>,
}

impl SceneEvent {
    pub fn new(data: SceneEventData, context: Context) -> Self {
        Self {
            data,
            context,
            time_fired: Utc::now(),
        }
    }

    pub fn kind(&self) -> SceneEventKind {
        self.data.kind()
    }
}
