//! Group scheduler
//!
//! Wires every chain of a group, opens the shared start gate so all chains
//! begin at once, and waits until every action of the group has settled.

use crate::chain::{ChainRunner, WiredAction};
use crate::completion::Completion;
use crate::error::EngineResult;
use crate::resolver::DependencyResolver;
use dashmap::DashMap;
use scene_config::{EngineConfig, SiblingFailurePolicy};
use scene_core::{
    ActionCall, ActionError, ActionId, ActionInvoker, ActionState, Context, SceneEventData,
    SceneGroup,
};
use scene_event_bus::SceneEventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Final states of one group's actions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    pub group: usize,
    pub succeeded: Vec<ActionId>,
    pub failed: Vec<ActionId>,
    pub skipped: Vec<ActionId>,
}

impl GroupOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs groups for one scene run
pub struct GroupScheduler {
    invoker: Arc<dyn ActionInvoker>,
    event_bus: Arc<SceneEventBus>,
    config: EngineConfig,
    context: Context,
    /// Latest state of every action seen during the run
    states: Arc<DashMap<ActionId, ActionState>>,
}

impl GroupScheduler {
    pub fn new(
        invoker: Arc<dyn ActionInvoker>,
        event_bus: Arc<SceneEventBus>,
        config: EngineConfig,
        context: Context,
    ) -> Self {
        Self {
            invoker,
            event_bus,
            config,
            context,
            states: Arc::new(DashMap::new()),
        }
    }

    /// Snapshot of every action state recorded so far
    pub fn states(&self) -> Vec<(ActionId, ActionState)> {
        let mut states: Vec<_> = self.states.iter().map(|e| (*e.key(), *e.value())).collect();
        states.sort_by_key(|(id, _)| *id);
        states
    }

    /// Wire, release and await one group
    pub async fn run_group(
        &self,
        index: usize,
        group: &SceneGroup,
        resolver: &mut DependencyResolver,
    ) -> EngineResult<GroupOutcome> {
        let (start, start_handle) = Completion::new();

        // Wire every chain before anything runs so intra-group references
        // to earlier chains resolve.
        let mut wired: Vec<WiredAction> = Vec::with_capacity(group.action_count());
        let mut group_ids = Vec::with_capacity(group.action_count());
        for (name, actions) in group.chains() {
            let chain = ChainRunner::new(resolver, self.config.unresolved_dependency)
                .wire(index, name, actions, &start_handle)?;

            for (id, wait_for) in &chain.missing {
                self.event_bus.emit(
                    SceneEventData::DependencyNotFound {
                        id: *id,
                        wait_for: *wait_for,
                    },
                    &self.context,
                );
            }
            for id in &chain.ignored {
                self.states.insert(*id, ActionState::Skipped);
                group_ids.push(*id);
                self.event_bus.emit(
                    SceneEventData::ActionSkipped {
                        id: *id,
                        reason: "waitFor target not found".to_string(),
                    },
                    &self.context,
                );
            }
            wired.extend(chain.actions);
        }

        for action in &wired {
            self.states.insert(action.id(), ActionState::Pending);
            group_ids.push(action.id());
        }

        info!(group = index, chains = group.chain_count(), actions = wired.len(), "Executing group");
        self.event_bus.emit(
            SceneEventData::GroupStarted {
                group: index,
                chains: group.chain_count(),
            },
            &self.context,
        );

        let mut tasks = JoinSet::new();
        for action in wired {
            tasks.spawn(execute_action(
                action,
                self.invoker.clone(),
                self.event_bus.clone(),
                self.context.clone(),
                self.states.clone(),
                self.config.action_timeout(),
            ));
        }

        // Release every chain at once
        start.set(ActionState::Done);

        let mut cancelled = false;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, ActionState::Failed)) => {
                    if self.config.sibling_failure == SiblingFailurePolicy::Cancel && !cancelled {
                        warn!(group = index, id = %id, "Action failed, cancelling the rest of the group");
                        tasks.abort_all();
                        cancelled = true;
                    }
                }
                Ok(_) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!(group = index, "Action task panicked: {}", e),
            }
        }

        let mut outcome = GroupOutcome {
            group: index,
            ..GroupOutcome::default()
        };

        for id in group_ids {
            let mut state = self.states.get(&id).map(|s| *s).unwrap_or_default();
            if !state.is_terminal() {
                // Aborted by cancellation, or its task panicked
                state = if cancelled {
                    ActionState::Skipped
                } else {
                    ActionState::Failed
                };
                self.states.insert(id, state);
                if state == ActionState::Skipped {
                    self.event_bus.emit(
                        SceneEventData::ActionSkipped {
                            id,
                            reason: "cancelled".to_string(),
                        },
                        &self.context,
                    );
                }
            }

            match state {
                ActionState::Done => outcome.succeeded.push(id),
                ActionState::Failed => outcome.failed.push(id),
                _ => outcome.skipped.push(id),
            }
        }

        debug!(
            group = index,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "Group settled"
        );
        self.event_bus.emit(
            SceneEventData::GroupFinished {
                group: index,
                success: outcome.is_success(),
            },
            &self.context,
        );

        Ok(outcome)
    }
}

/// Wait for the predecessor, then invoke the action unless it must be skipped
async fn execute_action(
    wired: WiredAction,
    invoker: Arc<dyn ActionInvoker>,
    event_bus: Arc<SceneEventBus>,
    context: Context,
    states: Arc<DashMap<ActionId, ActionState>>,
    timeout: Option<Duration>,
) -> (ActionId, ActionState) {
    let WiredAction {
        group,
        chain,
        action,
        predecessor,
        completion,
    } = wired;
    let id = action.id;

    let settle = |state: ActionState| {
        states.insert(id, state);
        completion.set(state);
        state
    };

    let predecessor_state = predecessor.wait().await;
    if predecessor_state != ActionState::Done {
        debug!(id = %id, predecessor = %predecessor_state, "Skipping action");
        event_bus.emit(
            SceneEventData::ActionSkipped {
                id,
                reason: format!("predecessor {}", predecessor_state),
            },
            &context,
        );
        return (id, settle(ActionState::Skipped));
    }

    settle(ActionState::Running);
    event_bus.emit(
        SceneEventData::ActionStarted {
            id,
            action: action.action.clone(),
            chain: chain.clone(),
            group,
        },
        &context,
    );

    if let Some(comment) = &action.comment {
        info!("{}", comment);
    }

    let call = ActionCall::new(id, action.action.clone(), action.payload, context.child());
    let result = match timeout {
        Some(after) => tokio::time::timeout(after, invoker.invoke(call))
            .await
            .unwrap_or_else(|_| {
                Err(ActionError::TimedOut {
                    after_ms: after.as_millis() as u64,
                })
            }),
        None => invoker.invoke(call).await,
    };

    match result {
        Ok(_) => {
            debug!(id = %id, action = %action.action, "Action completed");
            event_bus.emit(SceneEventData::ActionSucceeded { id }, &context);
            (id, settle(ActionState::Done))
        }
        Err(e) => {
            error!(id = %id, action = %action.action, chain = %chain, "Action failed: {}", e);
            event_bus.emit(
                SceneEventData::ActionFailed {
                    id,
                    error: e.to_string(),
                },
                &context,
            );
            (id, settle(ActionState::Failed))
        }
    }
}
