//! Asset loading for the garment mesh and decal textures.
//!
//! The mesh is preloaded at startup and resolved while the app is `Loading`.
//! Decal textures are requested reactively from the customization store and
//! settled against request tokens so late completions cannot clobber newer
//! requests.

/// Garment entity creation once the mesh has been resolved.
pub mod garment_creator;

/// Garment glTF preload and named node/material resolution.
pub mod mesh_loader;

/// Loading progress tracking resource for state transitions.
pub mod progress;

/// Browser fetch and decoding for decal images addressed by URL.
pub mod remote_image;

/// Post-load orientation, wrapping and filtering for decal textures.
pub mod texture_config;

/// Tokenised decal texture requests and the resources-ready gate.
pub mod texture_loader;
