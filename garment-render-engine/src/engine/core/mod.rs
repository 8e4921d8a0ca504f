//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, state transitions,
//! and plugin initialisation for both native and WASM targets.

/// Plugin configuration and system scheduling for the customizer.
///
/// Creates the main app with the render surface settings, asset loading,
/// garment systems and the RPC bridge.
pub mod app_setup;

/// Application state machine: loading, running, crashed.
pub mod app_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
