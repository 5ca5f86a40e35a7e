//! Built-in actions for the runner
//!
//! Registers `log`, `delay`, `fail`, the directional `move_*` actions and
//! the `queue_movement` / `execute_movement` pair on an [`ActionRegistry`],
//! all backed by a [`SimulatedDelta`].

use crate::delta::{Direction, Movement, SimulatedDelta};
use scene_action_registry::{ActionDescription, ActionRegistry, RegistryError};
use scene_core::{ActionCall, ActionError, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SimpleMovePayload {
    id: i64,
    amount: f64,
}

fn simple_move_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "amount"],
        "properties": {
            "id": {"type": "integer"},
            "amount": {"type": "number"}
        }
    })
}

fn movement_schema() -> Value {
    json!({
        "type": "object",
        "required": ["id", "duration", "points"],
        "properties": {
            "id": {"type": "integer"},
            "reference": {"enum": ["absolute", "relative"]},
            "duration": {"type": "integer", "minimum": 0},
            "points": {
                "type": "array",
                "items": {
                    "type": "array",
                    "items": {"type": "number"},
                    "minItems": 3,
                    "maxItems": 3
                }
            }
        }
    })
}

fn parse<T: serde::de::DeserializeOwned>(call: &ActionCall) -> Result<T, ActionError> {
    serde_json::from_value(call.payload.clone())
        .map_err(|e| ActionError::InvalidPayload(e.to_string()))
}

/// Register every built-in action on `registry`
pub fn register_builtin_actions(
    registry: &ActionRegistry,
    delta: Arc<SimulatedDelta>,
) -> Result<(), RegistryError> {
    registry.register_with_description(
        ActionDescription::new("log").with_description("Log payload.message at info level"),
        |call: ActionCall| async move {
            let message = call
                .get::<String>("message")
                .unwrap_or_else(|| call.payload.to_string());
            info!(id = %call.action_id, "{}", message);
            Ok(None)
        },
    )?;

    registry.register_with_description(
        ActionDescription::new("delay")
            .with_description("Wait payload.ms milliseconds")
            .with_schema(json!({
                "type": "object",
                "required": ["ms"],
                "properties": {"ms": {"type": "integer", "minimum": 0}}
            })),
        |call: ActionCall| async move {
            let ms = call.get::<u64>("ms").unwrap_or_default();
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(None)
        },
    )?;

    registry.register_with_description(
        ActionDescription::new("fail").with_description("Fail with payload.reason"),
        |call: ActionCall| async move {
            let reason = call
                .get::<String>("reason")
                .unwrap_or_else(|| "requested failure".to_string());
            Err(ActionError::CallFailed(reason))
        },
    )?;

    for direction in Direction::ALL {
        let delta = delta.clone();
        registry.register_with_description(
            ActionDescription::new(direction.action())
                .with_description("Straight relative move of payload.amount")
                .with_schema(simple_move_schema()),
            move |call: ActionCall| {
                let delta = delta.clone();
                async move { simple_move(&delta, direction, &call).await }
            },
        )?;
    }

    let queue_delta = delta.clone();
    registry.register_with_description(
        ActionDescription::new("queue_movement")
            .with_description("Queue a movement without starting it")
            .with_schema(movement_schema()),
        move |call: ActionCall| {
            let delta = queue_delta.clone();
            async move {
                let movement: Movement = parse(&call)?;
                let queued = delta.enqueue(movement).await;
                Ok(Some(json!({ "queued": queued })))
            }
        },
    )?;

    registry.register_with_description(
        ActionDescription::new("execute_movement")
            .with_description("Perform every queued movement"),
        move |_: ActionCall| {
            let delta = delta.clone();
            async move {
                let position = delta.execute_queue().await;
                Ok(Some(json!({ "position": position })))
            }
        },
    )?;

    Ok(())
}

async fn simple_move(delta: &SimulatedDelta, direction: Direction, call: &ActionCall) -> ActionResult {
    let payload: SimpleMovePayload = parse(call)?;
    info!(action = direction.action(), amount = payload.amount, "Moving effector");

    let position = delta
        .perform(Movement::line(payload.id, direction.offset(payload.amount)))
        .await;
    Ok(Some(json!({ "position": position })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene_core::{ActionId, Context};
    use tokio_test::{assert_err, assert_ok};

    fn registry() -> (ActionRegistry, Arc<SimulatedDelta>) {
        let registry = ActionRegistry::new();
        let delta = Arc::new(SimulatedDelta::new(0.0));
        register_builtin_actions(&registry, delta.clone()).unwrap();
        (registry, delta)
    }

    fn call(action: &str, payload: Value) -> ActionCall {
        ActionCall::new(ActionId(1), action, payload, Context::new())
    }

    #[tokio::test]
    async fn test_all_registered() {
        let (registry, _) = registry();
        for name in [
            "log",
            "delay",
            "fail",
            "move_up",
            "move_down",
            "move_left",
            "move_right",
            "move_forward",
            "move_back",
            "queue_movement",
            "execute_movement",
        ] {
            assert!(registry.has_action(name), "{name} missing");
        }
    }

    #[tokio::test]
    async fn test_simple_moves_update_position() {
        let (registry, delta) = registry();

        assert_ok!(registry.call(call("move_up", json!({"id": 1, "amount": 10}))).await);
        assert_ok!(registry.call(call("move_left", json!({"id": 2, "amount": 3}))).await);

        assert_eq!(delta.position().await, [3.0, 0.0, 10.0]);
    }

    #[tokio::test]
    async fn test_simple_move_requires_amount() {
        let (registry, _) = registry();

        let result = registry.call(call("move_up", json!({"id": 1}))).await;
        assert!(matches!(result, Err(ActionError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_queue_and_execute() {
        let (registry, delta) = registry();
        let movement = json!({"id": 7, "duration": 100, "points": [[0, 0, 0], [0, 2, 0]]});

        assert_ok!(registry.call(call("queue_movement", movement.clone())).await);
        assert_ok!(registry.call(call("queue_movement", movement)).await);
        assert_eq!(delta.queued().await, 2);

        let result = registry
            .call(call("execute_movement", Value::Null))
            .await
            .unwrap();
        assert_eq!(result, Some(json!({"position": [0.0, 4.0, 0.0]})));
    }

    #[tokio::test]
    async fn test_fail_and_delay() {
        let (registry, _) = registry();

        let err = assert_err!(registry.call(call("fail", json!({"reason": "jammed"}))).await);
        assert_eq!(err, ActionError::CallFailed("jammed".to_string()));

        assert_ok!(registry.call(call("delay", json!({"ms": 1}))).await);
        assert_ok!(registry.call(call("log", json!({"message": "hello"}))).await);
    }
}
