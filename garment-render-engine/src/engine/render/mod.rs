//! Decal compositing on top of Bevy's PBR pipeline.
//!
//! Decals reuse `StandardMaterial` shading. The extension only changes how the
//! decal pipeline treats the depth buffer.

/// Depth test/write and polygon offset overrides for decal layers.
pub mod decal_material;
