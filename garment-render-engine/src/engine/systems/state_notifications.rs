use bevy::prelude::*;

use crate::engine::store::reactive::{CustomizationStore, FieldSet};
use crate::rpc::web_rpc::WebRpcInterface;

/// Payload for a `state_changed` notification, or `None` when nothing changed.
pub fn state_changed_payload(store: &CustomizationStore, changes: FieldSet) -> Option<serde_json::Value> {
    if changes.is_empty() {
        return None;
    }
    let fields: Vec<&str> = changes.iter().map(|field| field.name()).collect();
    match serde_json::to_value(store.peek()) {
        Ok(state) => Some(serde_json::json!({ "fields": fields, "state": state })),
        Err(error) => {
            error!("Failed to serialize customization state: {}", error);
            None
        }
    }
}

/// Tell the frontend which fields moved since last frame.
pub fn broadcast_state_changes(mut store: ResMut<CustomizationStore>, mut rpc_interface: ResMut<WebRpcInterface>) {
    let changes = store.take_changes();
    if let Some(payload) = state_changed_payload(&store, changes) {
        rpc_interface.send_notification("state_changed", payload);
    }
}
