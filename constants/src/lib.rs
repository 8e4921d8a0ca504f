//! Shared compile-time configuration for the garment customizer.

/// Default customization values and decal placement.
pub mod customizer;

/// Asset locations relative to the asset root.
pub mod paths;

/// Render surface, lighting and camera settings.
pub mod render_settings;
