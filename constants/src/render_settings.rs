use bevy::render::settings::PowerPreference;

/// Options the render surface is created with.
///
/// `preserve_drawing_buffer` and `stencil` record the surface contract of the
/// web canvas only. Snapshots go through `Screenshot`, which reads the frame
/// back itself, and the depth-stencil format belongs to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSurfaceConfig {
    pub preserve_drawing_buffer: bool,
    pub power_preference: PowerPreference,
    /// Render into a high precision (HDR) target.
    pub high_precision: bool,
    pub stencil: bool,
    /// Multisample count used for antialiasing; 1 disables it.
    pub antialias_samples: u32,
}

pub const RENDER_SURFACE: RenderSurfaceConfig = RenderSurfaceConfig {
    preserve_drawing_buffer: true,
    power_preference: PowerPreference::HighPerformance,
    high_precision: true,
    stencil: true,
    antialias_samples: 4,
};

/// Canvas element the engine binds to on the web.
pub const CANVAS_SELECTOR: &str = "#bevy";

/// Scene camera field of view, in degrees.
pub const CAMERA_FOV_DEGREES: f32 = 30.0;

/// Ambient light brightness. Roughly an intensity of 0.5 under the city preset.
pub const AMBIENT_BRIGHTNESS: f32 = 400.0;

pub const ENVIRONMENT_INTENSITY: f32 = 900.0;

/// Directional key light that casts the garment shadow onto the backdrop.
pub const KEY_LIGHT_ILLUMINANCE: f32 = 4_000.0;

/// Backdrop plane behind the garment.
pub const BACKDROP_SIZE: f32 = 4.0;
pub const BACKDROP_DEPTH: f32 = -0.14;

/// Message shown when the 3D viewer crashes.
pub const CRASH_FALLBACK_MESSAGE: &str =
    "Something went wrong with the 3D viewer. Please refresh the page.";
