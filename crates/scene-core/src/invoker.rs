//! The boundary to whatever performs an action on a device

use crate::action::ActionId;
use crate::context::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result of one action invocation
pub type ActionResult = Result<Option<serde_json::Value>, ActionError>;

/// Errors reported by an action invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("action not found: {0}")]
    NotFound(String),

    #[error("action call failed: {0}")]
    CallFailed(String),

    #[error("invalid action payload: {0}")]
    InvalidPayload(String),

    #[error("action timed out after {after_ms} ms")]
    TimedOut { after_ms: u64 },
}

/// A request to perform one named action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCall {
    /// Id of the scene action issuing the call
    pub action_id: ActionId,

    /// Operation name (e.g., "move_up")
    pub action: String,

    /// Data passed to the operation
    pub payload: serde_json::Value,

    /// Child of the run context
    pub context: Context,
}

impl ActionCall {
    pub fn new(
        action_id: ActionId,
        action: impl Into<String>,
        payload: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            action_id,
            action: action.into(),
            payload,
            context,
        }
    }

    /// Get a value from the payload
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.payload
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Performs actions and settles once the device operation completes or fails
///
/// The engine does not know how an action is carried out; device transports,
/// simulations and test recorders all sit behind this trait.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(&self, call: ActionCall) -> ActionResult;
}

#[async_trait]
impl<T: ActionInvoker + ?Sized> ActionInvoker for Arc<T> {
    async fn invoke(&self, call: ActionCall) -> ActionResult {
        (**self).invoke(call).await
    }
}
