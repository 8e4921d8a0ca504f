use bevy::prelude::*;
use bevy::render::view::screenshot::{Screenshot, save_to_disk};
use constants::paths::DEFAULT_SNAPSHOT_FILE;
use serde::{Deserialize, Serialize};

use crate::engine::store::customization_state::DecalKind;
use crate::engine::store::reactive::CustomizationStore;
use crate::engine::systems::state_notifications::broadcast_state_changes;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the frontend and Bevy.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the frontend without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Notifications queued for the next flush.
    pub fn pending_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Snapshot file names requested over RPC, captured on the next frame.
#[derive(Resource, Default, Debug)]
pub struct SnapshotQueue {
    pending: Vec<String>,
}

impl SnapshotQueue {
    pub fn request(&mut self, file_name: String) {
        self.pending.push(file_name);
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }
}

/// Systems that drain incoming RPC messages and flush outgoing ones.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct RpcSystems;

/// Plugin establishing the postMessage RPC channel for iframe deployment.
///
/// Runs in every app state so the frontend keeps a working channel after a crash.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .init_resource::<SnapshotQueue>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (
                    process_incoming_messages,
                    handle_rpc_messages,
                    capture_requested_snapshots,
                    broadcast_state_changes,
                    send_outgoing_messages,
                )
                    .chain()
                    .in_set(RpcSystems),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Filled by the JS callback, drained once per frame.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Hand ownership to JS so the listener outlives this system.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing an incoming RPC message from the frontend.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut store: ResMut<CustomizationStore>,
    mut snapshots: ResMut<SnapshotQueue>,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut store, &mut snapshots) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                rpc_interface.send_notification(
                    "debug_message",
                    serde_json::json!({
                        "message": format!("Parse error: {}", parse_error)
                    }),
                );
            }
        }
    }
}

/// Apply one RPC request to the store and build its response.
///
/// Requests without an id are applied but get no response.
pub fn handle_rpc_request(
    request: &RpcRequest,
    store: &mut CustomizationStore,
    snapshots: &mut SnapshotQueue,
) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "get_state" => handle_get_state(store),
        "set_colour" => handle_set_colour(&request.params, store),
        "set_intro" => handle_set_intro(&request.params, store),
        "toggle_decal" => handle_toggle_decal(&request.params, store),
        "set_decal_image" => handle_set_decal_image(&request.params, store),
        "capture_snapshot" => handle_capture_snapshot(&request.params, snapshots),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            Err(RpcError::method_not_found(&request.method))
        }
    };

    let id = request.id.clone()?;
    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: &serde_json::Value,
    expected: &str,
) -> Result<T, RpcError> {
    serde_json::from_value::<T>(params.clone()).map_err(|_| RpcError::invalid_params(expected))
}

fn parse_decal(decal: &str) -> Result<DecalKind, RpcError> {
    DecalKind::from_string(decal)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown decal: {}", decal)))
}

fn handle_get_state(store: &CustomizationStore) -> Result<serde_json::Value, RpcError> {
    serde_json::to_value(store.peek()).map_err(|e| RpcError::internal_error(&e.to_string()))
}

fn handle_set_colour(
    params: &serde_json::Value,
    store: &mut CustomizationStore,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct SetColourParams {
        colour: String,
    }

    // Stored as given; an unparsable colour is rejected by the damper later.
    let parsed: SetColourParams = parse_params(params, "Expected 'colour' parameter")?;
    let changed = store.set_base_colour(parsed.colour);
    Ok(serde_json::json!({ "success": true, "changed": changed }))
}

fn handle_set_intro(
    params: &serde_json::Value,
    store: &mut CustomizationStore,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct SetIntroParams {
        visible: bool,
    }

    let parsed: SetIntroParams = parse_params(params, "Expected 'visible' parameter")?;
    let changed = store.set_intro_visible(parsed.visible);
    Ok(serde_json::json!({ "success": true, "changed": changed }))
}

fn handle_toggle_decal(
    params: &serde_json::Value,
    store: &mut CustomizationStore,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct ToggleDecalParams {
        decal: String,
        enabled: bool,
    }

    let parsed: ToggleDecalParams =
        parse_params(params, "Expected 'decal' and 'enabled' parameters")?;
    let kind = parse_decal(&parsed.decal)?;
    let changed = store.set_decal_enabled(kind, parsed.enabled);
    info!("{} decal enabled: {}", kind.as_str(), parsed.enabled);
    Ok(serde_json::json!({ "success": true, "changed": changed }))
}

fn handle_set_decal_image(
    params: &serde_json::Value,
    store: &mut CustomizationStore,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize)]
    struct SetDecalImageParams {
        decal: String,
        locator: String,
        #[serde(default)]
        fresh_upload: bool,
    }

    let parsed: SetDecalImageParams =
        parse_params(params, "Expected 'decal' and 'locator' parameters")?;
    let kind = parse_decal(&parsed.decal)?;
    let mut changed = store.set_decal_image(kind, parsed.locator);
    if kind == DecalKind::Logo {
        changed |= store.set_fresh_upload(parsed.fresh_upload);
    }
    Ok(serde_json::json!({ "success": true, "changed": changed }))
}

fn handle_capture_snapshot(
    params: &serde_json::Value,
    snapshots: &mut SnapshotQueue,
) -> Result<serde_json::Value, RpcError> {
    #[derive(Deserialize, Default)]
    struct CaptureSnapshotParams {
        file_name: Option<String>,
    }

    let parsed: CaptureSnapshotParams = if params.is_null() {
        CaptureSnapshotParams::default()
    } else {
        parse_params(params, "Expected optional 'file_name' parameter")?
    };
    let file_name = parsed
        .file_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SNAPSHOT_FILE.to_string());
    snapshots.request(file_name.clone());
    Ok(serde_json::json!({ "success": true, "file_name": file_name }))
}

/// Capture the primary window for every queued snapshot request.
fn capture_requested_snapshots(mut commands: Commands, mut snapshots: ResMut<SnapshotQueue>) {
    for file_name in snapshots.pending.drain(..) {
        info!("Capturing snapshot: {}", file_name);
        commands
            .spawn(Screenshot::primary_window())
            .observe(save_to_disk(file_name));
    }
}

/// Send queued notifications and responses to the frontend.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Responses after notifications so state_changed lands before the reply.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(serde_json::json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
