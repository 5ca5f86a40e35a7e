//! Registry of named async action handlers
//!
//! This crate provides the ActionRegistry, which maps action names used in
//! scene documents (`"move_up"`, `"delay"`, ...) to async handlers that carry
//! out the operation. The registry implements [`ActionInvoker`], so it can
//! be handed to the scene engine directly.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::BoxFuture;
use jsonschema::JSONSchema;
use scene_core::{ActionCall, ActionError, ActionInvoker, ActionResult};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Future type for async action handlers
pub type ActionFuture = BoxFuture<'static, ActionResult>;

/// Action handler function type
pub type ActionHandler = Arc<dyn Fn(ActionCall) -> ActionFuture + Send + Sync>;

/// Errors raised while registering actions
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("invalid payload schema for action {action}: {reason}")]
    InvalidSchema { action: String, reason: String },
}

/// Information about a registered action
#[derive(Debug, Clone)]
pub struct ActionDescription {
    /// Name referenced by scene documents
    pub name: String,
    /// Description of what the action does
    pub description: Option<String>,
    /// JSON schema the payload must satisfy (optional)
    pub schema: Option<serde_json::Value>,
}

impl ActionDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Internal representation of a registered action
struct RegisteredAction {
    handler: ActionHandler,
    validator: Option<Arc<JSONSchema>>,
    description: ActionDescription,
}

/// The action registry manages all invocable actions
///
/// The ActionRegistry is responsible for:
/// - Registering actions with their handlers and optional payload schemas
/// - Routing calls to the appropriate handler
/// - Providing information about available actions
pub struct ActionRegistry {
    /// Actions indexed by name
    actions: DashMap<String, RegisteredAction>,
}

impl ActionRegistry {
    /// Create a new empty action registry
    pub fn new() -> Self {
        Self {
            actions: DashMap::new(),
        }
    }

    /// Register a new action
    ///
    /// # Arguments
    /// * `name` - The action name used in scene documents (e.g., "move_up")
    /// * `handler` - Async function to handle calls
    /// * `schema` - Optional JSON schema for validating payloads
    pub fn register<F, Fut>(
        &self,
        name: impl Into<String>,
        handler: F,
        schema: Option<serde_json::Value>,
    ) -> Result<(), RegistryError>
    where
        F: Fn(ActionCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let mut description = ActionDescription::new(name);
        description.schema = schema;
        self.register_with_description(description, handler)
    }

    /// Register an action with full description
    #[instrument(skip(self, handler), fields(action = %description.name))]
    pub fn register_with_description<F, Fut>(
        &self,
        description: ActionDescription,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(ActionCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        let validator = match &description.schema {
            Some(schema) => {
                let compiled =
                    JSONSchema::compile(schema).map_err(|e| RegistryError::InvalidSchema {
                        action: description.name.clone(),
                        reason: e.to_string(),
                    })?;
                Some(Arc::new(compiled))
            }
            None => None,
        };

        debug!("Registering action");

        let handler: ActionHandler = Arc::new(move |call| Box::pin(handler(call)) as ActionFuture);

        if self
            .actions
            .insert(
                description.name.clone(),
                RegisteredAction {
                    handler,
                    validator,
                    description,
                },
            )
            .is_some()
        {
            debug!("Replaced previously registered action");
        }

        Ok(())
    }

    /// Call an action
    ///
    /// Fails with [`ActionError::NotFound`] for unknown names and with
    /// [`ActionError::InvalidPayload`] when the payload violates the schema.
    #[instrument(skip(self, call), fields(action = %call.action, id = %call.action_id))]
    pub async fn call(&self, call: ActionCall) -> ActionResult {
        let registered = self.actions.get(&call.action).ok_or_else(|| {
            warn!("Action not found");
            ActionError::NotFound(call.action.clone())
        })?;

        if let Some(validator) = &registered.validator {
            if let Err(errors) = validator.validate(&call.payload) {
                let reason = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
                return Err(ActionError::InvalidPayload(reason));
            }
        }

        let handler = registered.handler.clone();
        drop(registered); // Release the lock before calling the handler

        debug!("Calling action");
        handler(call).await
    }

    /// Check if an action exists
    pub fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Get action description
    pub fn get_action(&self, name: &str) -> Option<ActionDescription> {
        self.actions.get(name).map(|a| a.description.clone())
    }

    /// Names of all registered actions, sorted
    pub fn actions(&self) -> Vec<String> {
        let mut names: Vec<_> = self.actions.iter().map(|a| a.key().clone()).collect();
        names.sort();
        names
    }

    /// Unregister an action
    #[instrument(skip(self))]
    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.actions.remove(name).is_some();

        if removed {
            debug!("Unregistered action");
        }

        removed
    }

    /// Get total number of registered actions
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionInvoker for ActionRegistry {
    async fn invoke(&self, call: ActionCall) -> ActionResult {
        self.call(call).await
    }
}

/// Thread-safe wrapper for ActionRegistry
pub type SharedActionRegistry = Arc<ActionRegistry>;

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::{ActionId, Context};
    use serde_json::json;

    fn call(action: &str, payload: serde_json::Value) -> ActionCall {
        ActionCall::new(ActionId(1), action, payload, Context::new())
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let registry = ActionRegistry::new();

        registry
            .register(
                "echo",
                |call: ActionCall| async move { Ok(Some(call.payload)) },
                None,
            )
            .unwrap();

        let result = registry
            .call(call("echo", json!({"msg": "hello"})))
            .await
            .unwrap();

        assert_eq!(result, Some(json!({"msg": "hello"})));
    }

    #[tokio::test]
    async fn test_action_not_found() {
        let registry = ActionRegistry::new();

        let result = registry.call(call("nonexistent", json!({}))).await;

        assert!(matches!(result, Err(ActionError::NotFound(name)) if name == "nonexistent"));
    }

    #[tokio::test]
    async fn test_action_error() {
        let registry = ActionRegistry::new();

        registry
            .register(
                "explode",
                |_: ActionCall| async move {
                    Err(ActionError::CallFailed("intentional failure".to_string()))
                },
                None,
            )
            .unwrap();

        let result = registry.call(call("explode", json!({}))).await;

        assert!(matches!(result, Err(ActionError::CallFailed(_))));
    }

    #[tokio::test]
    async fn test_payload_schema() {
        let registry = ActionRegistry::new();

        registry
            .register(
                "move_up",
                |_: ActionCall| async { Ok(None) },
                Some(json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "integer"},
                        "amount": {"type": "number"}
                    },
                    "required": ["id", "amount"]
                })),
            )
            .unwrap();

        let ok = registry
            .call(call("move_up", json!({"id": 1, "amount": 2.5})))
            .await;
        tokio_test::assert_ok!(ok);

        let bad = registry.call(call("move_up", json!({"id": "one"}))).await;
        assert!(matches!(bad, Err(ActionError::InvalidPayload(_))));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let registry = ActionRegistry::new();

        let result = registry.register(
            "broken",
            |_: ActionCall| async { Ok(None) },
            Some(json!({"type": 12})),
        );

        assert!(matches!(result, Err(RegistryError::InvalidSchema { .. })));
        assert!(!registry.has_action("broken"));
    }

    #[test]
    fn test_actions_listing() {
        let registry = ActionRegistry::new();

        for name in ["move_up", "delay", "log"] {
            registry
                .register(name, |_: ActionCall| async { Ok(None) }, None)
                .unwrap();
        }

        assert_eq!(registry.actions(), vec!["delay", "log", "move_up"]);
        assert_eq!(registry.action_count(), 3);
    }

    #[test]
    fn test_description() {
        let registry = ActionRegistry::new();

        registry
            .register_with_description(
                ActionDescription::new("log").with_description("Write a log line"),
                |_: ActionCall| async { Ok(None) },
            )
            .unwrap();

        let description = registry.get_action("log").unwrap();
        assert_eq!(description.description.as_deref(), Some("Write a log line"));
        assert!(registry.get_action("missing").is_none());
    }

    #[test]
    fn test_unregister() {
        let registry = ActionRegistry::new();

        registry
            .register("log", |_: ActionCall| async { Ok(None) }, None)
            .unwrap();

        assert!(registry.has_action("log"));
        assert!(registry.unregister("log"));
        assert!(!registry.has_action("log"));
        assert!(!registry.unregister("log")); // Already removed
    }

    #[tokio::test]
    async fn test_registry_as_invoker() {
        let registry: Arc<dyn ActionInvoker> = {
            let registry = ActionRegistry::new();
            registry
                .register("noop", |_: ActionCall| async { Ok(None) }, None)
                .unwrap();
            Arc::new(registry)
        };

        let result = registry.invoke(call("noop", json!(null))).await;
        assert_eq!(result, Ok(None));
    }
}
