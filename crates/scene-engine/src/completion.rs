//! Completion handles
//!
//! Every wired action owns a [`Completion`] and publishes a
//! [`CompletionHandle`]. Same-chain successors and `waitFor` dependents
//! hold clones of the handle and wait for it to reach a terminal state.

use scene_core::ActionState;
use tokio::sync::watch;

/// Write side: owned by whoever executes the node
#[derive(Debug)]
pub struct Completion {
    tx: watch::Sender<ActionState>,
}

impl Completion {
    /// Create a pending completion and its handle
    pub fn new() -> (Self, CompletionHandle) {
        let (tx, rx) = watch::channel(ActionState::Pending);
        (Self { tx }, CompletionHandle { rx })
    }

    pub fn set(&self, state: ActionState) {
        self.tx.send_replace(state);
    }

    pub fn state(&self) -> ActionState {
        *self.tx.borrow()
    }
}

/// Read side: cheap to clone, observable after the completion is dropped
///
/// A completion dropped before reaching a terminal state (its task was
/// aborted or panicked) reads as [`ActionState::Skipped`] to waiters.
#[derive(Debug, Clone)]
pub struct CompletionHandle {
    rx: watch::Receiver<ActionState>,
}

impl CompletionHandle {
    /// A handle that is already settled in `state`
    pub fn settled(state: ActionState) -> Self {
        let (completion, handle) = Completion::new();
        completion.set(state);
        handle
    }

    /// Current state without waiting
    pub fn state(&self) -> ActionState {
        *self.rx.borrow()
    }

    /// Wait until the node settles and return its terminal state
    pub async fn wait(&self) -> ActionState {
        let mut rx = self.rx.clone();
        let settled = rx.wait_for(ActionState::is_terminal).await.map(|state| *state);
        settled.unwrap_or(ActionState::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_for_settle() {
        let (completion, handle) = Completion::new();
        let waiter = tokio::spawn({
            let handle = handle.clone();
            async move { handle.wait().await }
        });

        completion.set(ActionState::Running);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        completion.set(ActionState::Done);
        assert_eq!(waiter.await.unwrap(), ActionState::Done);
        assert_eq!(handle.state(), ActionState::Done);
    }

    #[tokio::test]
    async fn test_settled_handle_outlives_completion() {
        let handle = CompletionHandle::settled(ActionState::Failed);
        assert_eq!(handle.wait().await, ActionState::Failed);
    }

    #[tokio::test]
    async fn test_dropped_unsettled_reads_skipped() {
        let (completion, handle) = Completion::new();
        completion.set(ActionState::Running);
        drop(completion);

        assert_eq!(handle.wait().await, ActionState::Skipped);
    }
}
