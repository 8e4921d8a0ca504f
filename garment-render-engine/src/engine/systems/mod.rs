//! Per-frame runtime systems.
//!
//! Smooth damping for the garment colour and camera rig, and the state change
//! broadcast that keeps the frontend in sync with the store.

/// Critically damped smoothing shared by the colour and camera rig.
pub mod smooth_damp;

/// Eases the garment base colour toward the store's target colour.
pub mod colour_damping;

/// Pushes store mutations to the frontend as `state_changed` notifications.
pub mod state_notifications;
