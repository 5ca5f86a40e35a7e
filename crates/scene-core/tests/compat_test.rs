//! Compatibility tests for the scene document format
//!
//! These tests use scene documents in the shape produced by the dashboard's
//! scene editor to verify our Rust types parse them unchanged.

use scene_core::{ActionId, SceneDocument, FORMAT_VERSION};
use serde_json::json;

// ============================================================================
// Document shape
// ============================================================================

#[test]
fn test_compat_delta_scene() {
    let config = json!({
        "metadata": {
            "name": "delta demo",
            "formatVersion": "0.0.1",
            "created": "2020-03-02"
        },
        "actions": [
            {
                "delta": [
                    {"id": 1, "action": "move_up", "payload": {"id": 1, "amount": 50}, "comment": "raise"},
                    {"id": 2, "action": "move_left", "payload": {"id": 2, "amount": 20}},
                    {"id": 3, "action": "execute_movement", "payload": null}
                ],
                "lights": [
                    {"id": 10, "action": "set_led", "payload": {"r": 255, "g": 0, "b": 0}, "waitFor": 1}
                ]
            },
            {
                "delta": [
                    {"id": 4, "action": "move_down", "payload": {"id": 4, "amount": 50}}
                ]
            }
        ]
    });

    let doc: SceneDocument = serde_json::from_value(config).unwrap();
    assert_eq!(doc.metadata.format_version, FORMAT_VERSION);
    assert_eq!(doc.groups.len(), 2);

    let delta = doc.groups[0].chain("delta").unwrap();
    assert_eq!(delta.len(), 3);
    assert_eq!(delta[0].comment.as_deref(), Some("raise"));
    assert!(delta[2].payload.is_null());

    let lights = doc.groups[0].chain("lights").unwrap();
    assert_eq!(lights[0].wait_for, Some(ActionId(1)));
    assert!(doc.unresolved_dependencies().is_empty());
    assert!(doc.duplicate_ids().is_empty());
}

#[test]
fn test_compat_empty_groups() {
    let config = json!({
        "metadata": {"name": "empty", "formatVersion": "0.0.1"},
        "actions": [{}, {"idle": []}]
    });

    let doc: SceneDocument = serde_json::from_value(config).unwrap();
    assert_eq!(doc.groups.len(), 2);
    assert!(doc.groups[0].is_empty());
    assert_eq!(doc.groups[1].chain_count(), 1);
    assert_eq!(doc.action_count(), 0);
}

#[test]
fn test_compat_cross_group_reference() {
    let config = json!({
        "metadata": {"name": "cross", "formatVersion": "0.0.1"},
        "actions": [
            {"a": [{"id": 1, "action": "x"}]},
            {"b": [{"id": 2, "action": "y", "waitFor": 1}]}
        ]
    });

    let doc: SceneDocument = serde_json::from_value(config).unwrap();
    assert!(doc.unresolved_dependencies().is_empty());
}

#[test]
fn test_compat_missing_metadata_rejected() {
    let config = json!({
        "actions": [{"a": [{"id": 1, "action": "x"}]}]
    });

    assert!(serde_json::from_value::<SceneDocument>(config).is_err());
}

#[test]
fn test_compat_missing_action_name_rejected() {
    let config = json!({
        "metadata": {"name": "bad", "formatVersion": "0.0.1"},
        "actions": [{"a": [{"id": 1}]}]
    });

    assert!(serde_json::from_value::<SceneDocument>(config).is_err());
}

#[test]
fn test_compat_roundtrip_keeps_wire_names() {
    let config = json!({
        "metadata": {"name": "wire", "formatVersion": "0.0.1"},
        "actions": [{"a": [{"id": 1, "action": "x", "payload": {}, "waitFor": 0}]}]
    });

    let doc: SceneDocument = serde_json::from_value(config).unwrap();
    let value = serde_json::to_value(&doc).unwrap();

    assert_eq!(value["metadata"]["formatVersion"], "0.0.1");
    assert_eq!(value["actions"][0]["a"][0]["waitFor"], 0);
}
