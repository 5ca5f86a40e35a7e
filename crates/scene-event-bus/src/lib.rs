//! Event bus for scene execution progress
//!
//! The engine fires a [`SceneEvent`] for every lifecycle step of a run:
//! run start and finish, group boundaries, and each action starting,
//! settling or being skipped. Observers subscribe either to one
//! [`SceneEventKind`] or to everything.

use dashmap::DashMap;
use scene_core::{Context, SceneEvent, SceneEventData, SceneEventKind};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Default channel capacity for event subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Publishes scene events to any number of subscribers
///
/// Firing never blocks and never fails: events sent while nobody listens
/// are dropped, and slow subscribers observe `RecvError::Lagged`.
pub struct SceneEventBus {
    /// Per-kind broadcast senders, created on first subscription
    listeners: DashMap<SceneEventKind, broadcast::Sender<SceneEvent>>,
    /// Sender for subscribers of every kind
    match_all_sender: broadcast::Sender<SceneEvent>,
    /// Channel capacity
    capacity: usize,
}

impl SceneEventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (match_all_sender, _) = broadcast::channel(capacity);
        Self {
            listeners: DashMap::new(),
            match_all_sender,
            capacity,
        }
    }

    /// Subscribe to events of one kind
    pub fn subscribe(&self, kind: SceneEventKind) -> broadcast::Receiver<SceneEvent> {
        trace!(kind = %kind, "Subscribing to scene event kind");

        self.listeners
            .entry(kind)
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(self.capacity);
                tx
            })
            .subscribe()
    }

    /// Subscribe to all events
    pub fn subscribe_all(&self) -> broadcast::Receiver<SceneEvent> {
        self.match_all_sender.subscribe()
    }

    /// Fire an event to the subscribers of its kind and to match-all subscribers
    pub fn fire(&self, event: SceneEvent) {
        trace!(kind = %event.kind(), run = %event.context, "Firing scene event");

        if let Some(sender) = self.listeners.get(&event.kind()) {
            // Ignore send errors - they just mean no active receivers
            let _ = sender.send(event.clone());
        }

        let _ = self.match_all_sender.send(event);
    }

    /// Build and fire an event for `context`
    pub fn emit(&self, data: SceneEventData, context: &Context) {
        self.fire(SceneEvent::new(data, context.clone()));
    }

    /// Number of kinds that have been subscribed to
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for SceneEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe wrapper for SceneEventBus
pub type SharedSceneEventBus = Arc<SceneEventBus>;
