//! Mesh generation for decal layers.
//!
//! Decals are rendered as their own geometry: the part of the garment surface
//! that falls inside a projector box, re-emitted with box-space UVs.

/// Box projection of garment triangles into decal geometry.
pub mod decal_geometry;
