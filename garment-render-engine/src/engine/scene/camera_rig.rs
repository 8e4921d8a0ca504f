use bevy::prelude::*;
use bevy::render::view::Msaa;
use bevy::window::PrimaryWindow;
use constants::customizer::{
    RIG_BREAKPOINT_WIDTH, RIG_CUSTOMIZER_MOBILE_POSITION, RIG_CUSTOMIZER_POSITION,
    RIG_INTRO_BREAKPOINT_POSITION, RIG_INTRO_MOBILE_POSITION, RIG_INTRO_POSITION, RIG_MOBILE_WIDTH,
    RIG_POINTER_PITCH_DIVISOR, RIG_POINTER_YAW_DIVISOR,
};
use constants::paths::{CITY_DIFFUSE_MAP, CITY_SPECULAR_MAP};
use constants::render_settings::{CAMERA_FOV_DEGREES, ENVIRONMENT_INTENSITY, RENDER_SURFACE};

use crate::engine::garment::components::SceneMember;
use crate::engine::store::reactive::{CustomizationStore, SubscriberId};
use crate::engine::systems::smooth_damp::SmoothDamp;

/// The scene camera. Its position eases toward the layout target.
#[derive(Component, Debug, Default)]
pub struct CameraRig {
    damp: SmoothDamp<3>,
    intro_visible: bool,
}

/// Group holding the backdrop and the garment. It tilts after the pointer.
#[derive(Component, Debug, Default)]
pub struct RigGroup {
    damp: SmoothDamp<2>,
}

/// Camera position for the current layout.
pub fn rig_target_position(intro_visible: bool, viewport_width: f32) -> Vec3 {
    let mobile = viewport_width <= RIG_MOBILE_WIDTH;
    if intro_visible {
        if mobile {
            RIG_INTRO_MOBILE_POSITION
        } else if viewport_width <= RIG_BREAKPOINT_WIDTH {
            RIG_INTRO_BREAKPOINT_POSITION
        } else {
            RIG_INTRO_POSITION
        }
    } else if mobile {
        RIG_CUSTOMIZER_MOBILE_POSITION
    } else {
        RIG_CUSTOMIZER_POSITION
    }
}

/// Pitch and yaw for a pointer in normalized device coordinates (y up).
pub fn rig_tilt(pointer: Vec2) -> Vec2 {
    Vec2::new(
        pointer.y / RIG_POINTER_PITCH_DIVISOR,
        -pointer.x / RIG_POINTER_YAW_DIVISOR,
    )
}

fn msaa_for_samples(samples: u32) -> Msaa {
    match samples {
        0 | 1 => Msaa::Off,
        2 => Msaa::Sample2,
        8 => Msaa::Sample8,
        _ => Msaa::Sample4,
    }
}

pub fn spawn_camera_rig(mut commands: Commands, asset_server: Res<AssetServer>) {
    commands.spawn((
        Camera3d::default(),
        Camera {
            hdr: RENDER_SURFACE.high_precision,
            ..default()
        },
        Projection::Perspective(PerspectiveProjection {
            fov: CAMERA_FOV_DEGREES.to_radians(),
            ..default()
        }),
        msaa_for_samples(RENDER_SURFACE.antialias_samples),
        // "city" preset.
        EnvironmentMapLight {
            diffuse_map: asset_server.load(CITY_DIFFUSE_MAP),
            specular_map: asset_server.load(CITY_SPECULAR_MAP),
            intensity: ENVIRONMENT_INTENSITY,
            ..default()
        },
        Transform::from_translation(RIG_INTRO_POSITION),
        CameraRig {
            intro_visible: true,
            ..default()
        },
    ));

    commands.spawn((
        Transform::default(),
        Visibility::default(),
        RigGroup::default(),
        SceneMember,
    ));
}

/// Ease the camera to its layout position and tilt the rig group after the pointer.
pub fn update_camera_rig(
    mut store: ResMut<CustomizationStore>,
    mut subscription: Local<Option<SubscriberId>>,
    mut cameras: Query<(&mut Transform, &mut CameraRig), Without<RigGroup>>,
    mut groups: Query<(&mut Transform, &mut RigGroup), Without<CameraRig>>,
    window: Query<&Window, With<PrimaryWindow>>,
    time: Res<Time>,
) {
    let id = *subscription.get_or_insert_with(|| store.subscribe("camera_rig"));
    let intro_visible = if store.is_dirty(id) {
        Some(store.track(id, |snap| snap.intro_visible()))
    } else {
        None
    };

    let Ok(window) = window.single() else {
        return;
    };
    let delta = time.delta_secs();

    for (mut transform, mut rig) in &mut cameras {
        if let Some(intro_visible) = intro_visible {
            rig.intro_visible = intro_visible;
        }
        let target = rig_target_position(rig.intro_visible, window.width());
        let mut position = transform.translation.to_array();
        if rig.damp.step(&mut position, target.to_array(), delta) {
            transform.translation = Vec3::from_array(position);
        }
    }

    let pointer = window
        .cursor_position()
        .map(|cursor| {
            let size = window.size().max(Vec2::ONE);
            Vec2::new(cursor.x / size.x * 2.0 - 1.0, -(cursor.y / size.y * 2.0 - 1.0))
        })
        .unwrap_or(Vec2::ZERO);
    let tilt = rig_tilt(pointer);

    for (mut transform, mut group) in &mut groups {
        let (pitch, yaw, _) = transform.rotation.to_euler(EulerRot::XYZ);
        let mut angles = [pitch, yaw];
        if group.damp.step(&mut angles, tilt.to_array(), delta) {
            transform.rotation = Quat::from_euler(EulerRot::XYZ, angles[0], angles[1], 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_offsets_the_camera_on_wide_screens() {
        assert_eq!(rig_target_position(true, 1920.0), Vec3::new(-0.4, 0.0, 2.0));
        assert_eq!(rig_target_position(false, 1920.0), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn narrow_viewports_recentre_and_pull_back() {
        assert_eq!(rig_target_position(true, 1260.0), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(rig_target_position(true, 600.0), Vec3::new(0.0, 0.2, 2.5));
        assert_eq!(rig_target_position(false, 400.0), Vec3::new(0.0, 0.0, 2.5));
    }

    #[test]
    fn pointer_tilt_is_scaled_per_axis() {
        assert_eq!(rig_tilt(Vec2::ZERO), Vec2::ZERO);
        let tilt = rig_tilt(Vec2::new(1.0, 1.0));
        assert!((tilt.x - 0.1).abs() < 1e-6);
        assert!((tilt.y + 0.2).abs() < 1e-6);
    }

    #[test]
    fn antialias_samples_map_onto_msaa() {
        assert_eq!(msaa_for_samples(4), Msaa::Sample4);
        assert_eq!(msaa_for_samples(1), Msaa::Off);
    }
}
