//! Run reports

use crate::error::EngineError;
use scene_core::{ActionId, ActionState, Context};
use std::collections::BTreeMap;
use std::fmt;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every group completed without a failed action
    Succeeded,
    /// The scene did not load, or a group failed
    Failed,
    /// Another run held the execution gate; nothing was parsed or invoked
    Rejected,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one [`SceneEngine::run`](crate::SceneEngine::run)
#[derive(Debug)]
pub struct RunReport {
    /// Context of the run; action invocations carry children of it
    pub context: Context,
    /// Where the scene came from (file path or "<document>")
    pub source: String,
    /// Scene name, once the document loaded
    pub scene: Option<String>,
    pub status: RunStatus,
    /// First error that ended the run
    pub failure: Option<EngineError>,
    /// Groups that finished without a failed action
    pub groups_completed: usize,
    /// Final state of every action of the loaded document
    pub actions: BTreeMap<ActionId, ActionState>,
}

impl RunReport {
    pub(crate) fn new(context: Context, source: impl Into<String>) -> Self {
        Self {
            context,
            source: source.into(),
            scene: None,
            status: RunStatus::Succeeded,
            failure: None,
            groups_completed: 0,
            actions: BTreeMap::new(),
        }
    }

    pub(crate) fn rejected(context: Context, source: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Rejected,
            ..Self::new(context, source)
        }
    }

    pub(crate) fn fail(&mut self, error: EngineError) {
        self.status = RunStatus::Failed;
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn is_rejected(&self) -> bool {
        self.status == RunStatus::Rejected
    }

    pub fn action_state(&self, id: ActionId) -> Option<ActionState> {
        self.actions.get(&id).copied()
    }

    /// Ids that ended in `state`, ascending
    pub fn actions_in(&self, state: ActionState) -> Vec<ActionId> {
        self.actions
            .iter()
            .filter(|(_, s)| **s == state)
            .map(|(id, _)| *id)
            .collect()
    }
}
