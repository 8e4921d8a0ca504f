use bevy::prelude::*;
use bevy::render::mesh::MeshAabb;

use crate::engine::assets::garment_assets::GarmentAssets;
use crate::engine::error::SceneError;
use crate::engine::garment::components::{Garment, GarmentCentre, SceneMember};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::scene::camera_rig::RigGroup;

/// Spawn the garment once its mesh and material are resolved.
///
/// The mesh is offset so the centre of its bounding box sits at the origin.
pub fn spawn_garment_when_ready(
    mut commands: Commands,
    mut loading_progress: ResMut<LoadingProgress>,
    assets: Res<GarmentAssets>,
    meshes: Res<Assets<Mesh>>,
    rig_group: Query<Entity, With<RigGroup>>,
) -> Result<(), SceneError> {
    if loading_progress.garment_spawned || !loading_progress.mesh_resolved {
        return Ok(());
    }
    let Some((mesh, material)) = assets.resolved() else {
        return Ok(());
    };
    let (mesh, material) = (mesh.clone(), material.clone());

    let centre: Vec3 = meshes
        .get(&mesh)
        .ok_or(SceneError::AssetReleased)?
        .compute_aabb()
        .ok_or(SceneError::MissingVertexAttribute { attribute: "POSITION" })?
        .center
        .into();

    let centre_entity = commands
        .spawn((
            Transform::default(),
            Visibility::default(),
            GarmentCentre,
            SceneMember,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                Transform::from_translation(-centre),
                Garment,
            ));
        })
        .id();
    if let Ok(group) = rig_group.single() {
        commands.entity(centre_entity).insert(ChildOf(group));
    }

    loading_progress.garment_spawned = true;
    info!("✓ Garment spawned (centred by {:?})", -centre);
    Ok(())
}
