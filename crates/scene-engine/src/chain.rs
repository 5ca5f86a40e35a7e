//! Chain runner
//!
//! Wires one named chain into the task graph. Wiring only builds edges and
//! registers handles; nothing runs until the group's start gate opens.

use crate::completion::{Completion, CompletionHandle};
use crate::error::{EngineError, EngineResult};
use crate::resolver::DependencyResolver;
use scene_config::UnresolvedDependencyPolicy;
use scene_core::{ActionId, SceneAction};
use tracing::{debug, warn};

/// An action ready to be executed once its predecessor settles
#[derive(Debug)]
pub struct WiredAction {
    pub group: usize,
    pub chain: String,
    pub action: SceneAction,
    /// Chain predecessor, `waitFor` target, or the start gate
    pub predecessor: CompletionHandle,
    pub completion: Completion,
}

impl WiredAction {
    pub fn id(&self) -> ActionId {
        self.action.id
    }
}

/// Result of wiring one chain
#[derive(Debug)]
pub struct WiredChain {
    pub name: String,
    pub actions: Vec<WiredAction>,
    /// Actions dropped under [`UnresolvedDependencyPolicy::Ignore`]
    pub ignored: Vec<ActionId>,
    /// `(id, wait_for)` pairs whose `waitFor` did not resolve
    pub missing: Vec<(ActionId, ActionId)>,
    /// Handle of the last wired node; settles when the chain is done
    pub tail: CompletionHandle,
}

/// Wires chains against a shared [`DependencyResolver`]
pub struct ChainRunner<'a> {
    resolver: &'a mut DependencyResolver,
    policy: UnresolvedDependencyPolicy,
}

impl<'a> ChainRunner<'a> {
    pub fn new(resolver: &'a mut DependencyResolver, policy: UnresolvedDependencyPolicy) -> Self {
        Self { resolver, policy }
    }

    /// Wire `actions` of chain `name` behind `start`
    ///
    /// Each action hangs off the current chain tail, or off its `waitFor`
    /// target when it declares one. Its handle is registered under its id
    /// and becomes the new tail.
    pub fn wire(
        &mut self,
        group: usize,
        name: &str,
        actions: &[SceneAction],
        start: &CompletionHandle,
    ) -> EngineResult<WiredChain> {
        let mut tail = start.clone();
        let mut wired = Vec::with_capacity(actions.len());
        let mut ignored = Vec::new();
        let mut missing = Vec::new();

        for action in actions {
            let predecessor = match action.wait_for {
                Some(wait_for) => match self.resolver.lookup(wait_for) {
                    Some(handle) => handle.clone(),
                    None => {
                        missing.push((action.id, wait_for));
                        match self.policy {
                            UnresolvedDependencyPolicy::Reject => {
                                return Err(EngineError::UnresolvedDependency {
                                    id: action.id,
                                    wait_for,
                                });
                            }
                            UnresolvedDependencyPolicy::RunAfterChainTail => {
                                warn!(
                                    id = %action.id,
                                    wait_for = %wait_for,
                                    chain = name,
                                    "Could not find the action to wait for, running after chain tail"
                                );
                                tail.clone()
                            }
                            UnresolvedDependencyPolicy::Ignore => {
                                warn!(
                                    id = %action.id,
                                    wait_for = %wait_for,
                                    chain = name,
                                    "Could not find the action to wait for, action will not run"
                                );
                                self.resolver.register(action.id, tail.clone());
                                ignored.push(action.id);
                                continue;
                            }
                        }
                    }
                },
                None => tail.clone(),
            };

            let (completion, handle) = Completion::new();
            self.resolver.register(action.id, handle.clone());
            tail = handle;

            wired.push(WiredAction {
                group,
                chain: name.to_string(),
                action: action.clone(),
                predecessor,
                completion,
            });
        }

        debug!(
            chain = name,
            group,
            wired = wired.len(),
            ignored = ignored.len(),
            "Chain wired"
        );

        Ok(WiredChain {
            name: name.to_string(),
            actions: wired,
            ignored,
            missing,
            tail,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::ActionState;

    fn wire(
        resolver: &mut DependencyResolver,
        policy: UnresolvedDependencyPolicy,
        actions: &[SceneAction],
    ) -> EngineResult<(Completion, WiredChain)> {
        let (start, start_handle) = Completion::new();
        let chain = ChainRunner::new(resolver, policy).wire(0, "arm", actions, &start_handle)?;
        Ok((start, chain))
    }

    #[tokio::test]
    async fn test_serial_chain_edges() {
        let mut resolver = DependencyResolver::new();
        let actions = [SceneAction::new(1, "a"), SceneAction::new(2, "b")];
        let (start, chain) =
            wire(&mut resolver, UnresolvedDependencyPolicy::Reject, &actions).unwrap();

        assert_eq!(chain.actions.len(), 2);
        assert_eq!(resolver.len(), 2);

        // First action hangs off the start gate
        assert_eq!(chain.actions[0].predecessor.state(), ActionState::Pending);
        start.set(ActionState::Done);
        assert_eq!(chain.actions[0].predecessor.state(), ActionState::Done);

        // Second action hangs off the first
        chain.actions[0].completion.set(ActionState::Failed);
        assert_eq!(chain.actions[1].predecessor.state(), ActionState::Failed);

        // Tail is the last action
        chain.actions[1].completion.set(ActionState::Skipped);
        assert_eq!(chain.tail.wait().await, ActionState::Skipped);
    }

    #[test]
    fn test_wait_for_splices_predecessor() {
        let mut resolver = DependencyResolver::new();
        resolver.register(ActionId(7), CompletionHandle::settled(ActionState::Done));

        let actions = [
            SceneAction::new(1, "a"),
            SceneAction::new(2, "b").with_wait_for(7),
            SceneAction::new(3, "c"),
        ];
        let (_start, chain) =
            wire(&mut resolver, UnresolvedDependencyPolicy::Reject, &actions).unwrap();

        assert_eq!(chain.actions[1].predecessor.state(), ActionState::Done);
        // Action 3 follows action 2, the new tail
        chain.actions[1].completion.set(ActionState::Failed);
        assert_eq!(chain.actions[2].predecessor.state(), ActionState::Failed);
        assert!(chain.missing.is_empty());
    }

    #[test]
    fn test_unresolved_rejected() {
        let mut resolver = DependencyResolver::new();
        let actions = [SceneAction::new(1, "a").with_wait_for(99)];

        let result = wire(&mut resolver, UnresolvedDependencyPolicy::Reject, &actions);
        assert!(matches!(
            result,
            Err(EngineError::UnresolvedDependency { id, wait_for })
                if id == ActionId(1) && wait_for == ActionId(99)
        ));
    }

    #[test]
    fn test_unresolved_runs_after_tail() {
        let mut resolver = DependencyResolver::new();
        let actions = [
            SceneAction::new(1, "a"),
            SceneAction::new(2, "b").with_wait_for(99),
        ];
        let (_start, chain) = wire(
            &mut resolver,
            UnresolvedDependencyPolicy::RunAfterChainTail,
            &actions,
        )
        .unwrap();

        assert_eq!(chain.actions.len(), 2);
        assert_eq!(chain.missing, vec![(ActionId(2), ActionId(99))]);
        chain.actions[0].completion.set(ActionState::Done);
        assert_eq!(chain.actions[1].predecessor.state(), ActionState::Done);
    }

    #[test]
    fn test_unresolved_ignored_aliases_tail() {
        let mut resolver = DependencyResolver::new();
        let actions = [
            SceneAction::new(1, "a"),
            SceneAction::new(2, "b").with_wait_for(99),
            SceneAction::new(3, "c"),
        ];
        let (_start, chain) =
            wire(&mut resolver, UnresolvedDependencyPolicy::Ignore, &actions).unwrap();

        let ids: Vec<_> = chain.actions.iter().map(WiredAction::id).collect();
        assert_eq!(ids, vec![ActionId(1), ActionId(3)]);
        assert_eq!(chain.ignored, vec![ActionId(2)]);

        // Id 2 resolves to action 1's handle
        chain.actions[0].completion.set(ActionState::Done);
        assert_eq!(
            resolver.lookup(ActionId(2)).map(CompletionHandle::state),
            Some(ActionState::Done)
        );
        assert_eq!(chain.actions[1].predecessor.state(), ActionState::Done);
    }

    #[test]
    fn test_empty_chain_tail_is_start() {
        let mut resolver = DependencyResolver::new();
        let (start, chain) = wire(&mut resolver, UnresolvedDependencyPolicy::Reject, &[]).unwrap();

        start.set(ActionState::Done);
        assert_eq!(chain.tail.state(), ActionState::Done);
    }
}
