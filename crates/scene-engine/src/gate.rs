//! Execution gate
//!
//! At most one scene may be loading or executing per engine. The gate is
//! the engine's state holder: acquiring it moves `Idle` to `Locked`, and the
//! returned guard puts it back to `Idle` when dropped, on every exit path.

use std::fmt;
use tokio::sync::watch;
use tracing::trace;

/// Where the engine is in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Locked,
    LoadingDocument,
    ExecutingGroup(usize),
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Locked => f.write_str("locked"),
            Self::LoadingDocument => f.write_str("loading_document"),
            Self::ExecutingGroup(index) => write!(f, "executing_group({})", index),
        }
    }
}

/// Single-flight lock over scene runs
#[derive(Debug)]
pub struct ExecutionGate {
    state: watch::Sender<EngineState>,
}

impl ExecutionGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        Self { state }
    }

    /// Take the gate if it is free; `None` while another run holds it
    pub fn try_acquire(&self) -> Option<GateGuard<'_>> {
        let acquired = self.state.send_if_modified(|state| {
            if *state == EngineState::Idle {
                *state = EngineState::Locked;
                true
            } else {
                false
            }
        });

        if acquired {
            trace!("Execution gate acquired");
            Some(GateGuard { gate: self })
        } else {
            None
        }
    }

    pub fn is_held(&self) -> bool {
        self.state() != EngineState::Idle
    }

    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }
}

impl Default for ExecutionGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of holding the gate; releases it on drop
#[derive(Debug)]
pub struct GateGuard<'a> {
    gate: &'a ExecutionGate,
}

impl GateGuard<'_> {
    /// Record progress of the run holding the gate
    pub fn transition(&self, state: EngineState) {
        // Idle is reserved for release
        if state != EngineState::Idle {
            self.gate.state.send_replace(state);
        }
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.state.send_replace(EngineState::Idle);
        trace!("Execution gate released");
    }
}
