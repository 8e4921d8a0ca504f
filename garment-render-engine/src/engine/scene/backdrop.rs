use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use constants::render_settings::{BACKDROP_DEPTH, BACKDROP_SIZE};

use crate::engine::garment::components::SceneMember;
use crate::engine::scene::camera_rig::RigGroup;

#[derive(Component, Debug)]
pub struct Backdrop;

/// Plane facing the camera just behind the garment. It only receives shadows
/// and tilts with the rig group.
pub fn spawn_backdrop(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    rig_group: Query<Entity, With<RigGroup>>,
) {
    let plane = Plane3d::new(Vec3::Z, Vec2::splat(BACKDROP_SIZE * 0.5));
    let backdrop = commands.spawn((
        Mesh3d(meshes.add(plane)),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.95, 0.95, 0.95),
            perceptual_roughness: 1.0,
            reflectance: 0.0,
            ..default()
        })),
        Transform::from_xyz(0.0, 0.0, BACKDROP_DEPTH),
        NotShadowCaster,
        Backdrop,
        SceneMember,
    )).id();

    if let Ok(group) = rig_group.single() {
        commands.entity(backdrop).insert(ChildOf(group));
    }
}
