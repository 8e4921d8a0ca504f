//! Shared customization state observed by the garment, camera rig and RPC bridge.
//!
//! The store is a single Bevy resource. Systems subscribe once, read fields
//! through a tracked snapshot, and are marked dirty only when a field they read
//! on their last pass changes.

/// The customization record and its defaults.
pub mod customization_state;

/// Field-level dependency tracking and change notification.
pub mod reactive;
