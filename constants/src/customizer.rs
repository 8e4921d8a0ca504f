use bevy::math::Vec3;

/// Base colour the garment starts at and damps towards on first load.
pub const DEFAULT_BASE_COLOUR: &str = "#EFBD48";

/// Smooth time (seconds) for the base colour and camera rig damping.
pub const DAMPING_SMOOTH_TIME: f32 = 0.25;

/// Distance under which a damped value snaps onto its target.
pub const DAMPING_EPSILON: f32 = 0.001;

/// Polygon offset factor shared by both decal layers.
pub const DECAL_POLYGON_OFFSET_FACTOR: i32 = -4;

/// Anisotropic filtering applied to the full-coverage texture.
pub const FULL_DECAL_ANISOTROPY: u16 = 8;

/// Full-coverage decal projector: centred, identity rotation, unit box.
pub const FULL_DECAL_TRANSLATION: Vec3 = Vec3::ZERO;
pub const FULL_DECAL_ROTATION: Vec3 = Vec3::ZERO;
pub const FULL_DECAL_SCALE: Vec3 = Vec3::ONE;

/// Logo decal projector: chest position, slightly proud of the surface.
pub const LOGO_DECAL_TRANSLATION: Vec3 = Vec3::new(0.0, 0.04, 0.15);
pub const LOGO_DECAL_ROTATION: Vec3 = Vec3::ZERO;
pub const LOGO_DECAL_SCALE: Vec3 = Vec3::splat(0.15);

/// Camera rig targets. Intro mode shifts the garment off-centre.
pub const RIG_INTRO_POSITION: Vec3 = Vec3::new(-0.4, 0.0, 2.0);
pub const RIG_INTRO_BREAKPOINT_POSITION: Vec3 = Vec3::new(0.0, 0.0, 2.0);
pub const RIG_INTRO_MOBILE_POSITION: Vec3 = Vec3::new(0.0, 0.2, 2.5);
pub const RIG_CUSTOMIZER_POSITION: Vec3 = Vec3::new(0.0, 0.0, 2.0);
pub const RIG_CUSTOMIZER_MOBILE_POSITION: Vec3 = Vec3::new(0.0, 0.0, 2.5);

/// Viewport widths (logical px) at which the rig switches layout.
pub const RIG_BREAKPOINT_WIDTH: f32 = 1260.0;
pub const RIG_MOBILE_WIDTH: f32 = 600.0;

/// Pointer-follow tilt divisors for the rig (pitch, yaw).
pub const RIG_POINTER_PITCH_DIVISOR: f32 = 10.0;
pub const RIG_POINTER_YAW_DIVISOR: f32 = 5.0;
