//! Scene host: the fixed composition around the garment.
//!
//! Lighting, the backdrop and the camera rig are spawned once at startup. The
//! crash boundary tears the scene down if any garment system fails.

/// Ambient light and the key light that shadows the backdrop.
pub mod lighting;

/// Shadow-receiving plane behind the garment.
pub mod backdrop;

/// Camera placement, environment lighting, and pointer-follow tilt.
pub mod camera_rig;

/// Captures fatal scene errors and swaps the scene for a fallback message.
pub mod crash_boundary;
