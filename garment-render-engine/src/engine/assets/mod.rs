//! Asset handles for the garment and its decal textures.

/// Garment glTF handle and the mesh/material resolved from it.
pub mod garment_assets;
