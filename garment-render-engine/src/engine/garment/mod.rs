//! The garment entity and the decal layers mounted on it.
//!
//! Decals are derived from the store and the texture request gate every time
//! either changes, then reconciled against the decal entities already spawned.

/// Marker components for the garment hierarchy.
pub mod components;

/// Decal set derivation, placement, and entity reconciliation.
pub mod decals;
