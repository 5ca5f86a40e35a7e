//! Dependency resolver
//!
//! Maps action ids to the completion handle of the node that represents
//! "this action has run". The map lives for a whole run and is never
//! cleared, so `waitFor` can reach actions of earlier groups.

use crate::completion::CompletionHandle;
use scene_core::ActionId;
use std::collections::HashMap;
use tracing::{trace, warn};

#[derive(Debug, Default)]
pub struct DependencyResolver {
    handles: HashMap<ActionId, CompletionHandle>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the handle for `id`, returning any handle it replaces
    pub fn register(&mut self, id: ActionId, handle: CompletionHandle) -> Option<CompletionHandle> {
        trace!(id = %id, "Registering completion handle");

        let previous = self.handles.insert(id, handle);
        if previous.is_some() {
            warn!(id = %id, "Action id registered twice, earlier references keep the old handle");
        }
        previous
    }

    pub fn lookup(&self, id: ActionId) -> Option<&CompletionHandle> {
        self.handles.get(&id)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::ActionState;

    #[test]
    fn test_register_and_lookup() {
        let mut resolver = DependencyResolver::new();
        assert!(resolver.is_empty());

        resolver.register(ActionId(1), CompletionHandle::settled(ActionState::Done));

        assert!(resolver.contains(ActionId(1)));
        assert_eq!(
            resolver.lookup(ActionId(1)).map(CompletionHandle::state),
            Some(ActionState::Done)
        );
        assert!(resolver.lookup(ActionId(2)).is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut resolver = DependencyResolver::new();

        let first = resolver.register(ActionId(1), CompletionHandle::settled(ActionState::Done));
        let second =
            resolver.register(ActionId(1), CompletionHandle::settled(ActionState::Failed));

        assert!(first.is_none());
        assert_eq!(second.map(|h| h.state()), Some(ActionState::Done));
        assert_eq!(resolver.len(), 1);
    }
}
