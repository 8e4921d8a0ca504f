//! JSON-RPC 2.0 bridge between the customizer UI and the engine.
//!
//! The engine runs inside an iframe. The host page posts JSON-RPC messages to
//! it and receives responses and notifications back through `postMessage`.
//!
//! ```text
//! Customizer UI (parent)  <──postMessage──>  Bevy (iframe)
//!        │                                        │
//!        ├─ set_colour {colour} (id: 7) ────────> │
//!        │                                        ├─ store.set_base_colour
//!        │ <──────────── state_changed (no id) ───┤
//!        │ <───────────── {"success": true} (7) ──┤
//! ```
//!
//! Messages without an `id` are applied like requests but never answered.
//!
//! ## Methods
//!
//! - `get_state`: full customization state
//! - `set_colour {colour}`: target base colour, stored as given
//! - `set_intro {visible}`: intro layout on or off
//! - `toggle_decal {decal, enabled}`: `decal` is `"logo"` or `"full"`
//! - `set_decal_image {decal, locator, fresh_upload?}`: the flag only affects the logo
//! - `capture_snapshot {file_name?}`: save the next frame as a PNG
//!
//! ## Notifications
//!
//! - `state_changed {fields, state}`
//! - `texture_load_failed {decal, locator, error}`
//! - `decals_updated {logo, full}`
//! - `viewer_crashed {context, error}`
//! - `debug_message {message}` for unparsable input
//!
//! Errors use the standard codes: `-32601` unknown method, `-32602` bad
//! params, `-32603` internal.

/// Request handling, notifications, snapshot capture and the WASM message listener.
pub mod web_rpc;
