use bevy::asset::LoadState;
use bevy::gltf::{Gltf, GltfMesh, GltfNode};
use bevy::prelude::*;
use constants::paths::{GARMENT_MATERIAL, GARMENT_MESH_NODE, GARMENT_MESH_PATH};

use crate::engine::assets::garment_assets::GarmentAssets;
use crate::engine::error::SceneError;
use crate::engine::loading::progress::LoadingProgress;

// Request the garment glTF before anything tries to render it.
pub fn preload_garment_mesh(
    mut assets: ResMut<GarmentAssets>,
    mut loading_progress: ResMut<LoadingProgress>,
    asset_server: Res<AssetServer>,
) {
    info!("Preloading garment mesh: {}", GARMENT_MESH_PATH);
    assets.gltf = asset_server.load(GARMENT_MESH_PATH);
    loading_progress.mesh_requested = true;
}

/// Wait for the garment glTF and pull the shirt mesh and base material out of it.
///
/// A failed load or a missing node/material is fatal and is returned to the
/// crash boundary.
pub fn resolve_garment_mesh(
    mut loading_progress: ResMut<LoadingProgress>,
    mut assets: ResMut<GarmentAssets>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    gltf_nodes: Res<Assets<GltfNode>>,
    gltf_meshes: Res<Assets<GltfMesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result<(), SceneError> {
    if loading_progress.mesh_resolved || !loading_progress.mesh_requested {
        return Ok(());
    }

    match asset_server.get_load_state(&assets.gltf) {
        Some(LoadState::Loaded) => {}
        Some(LoadState::Failed(error)) => {
            return Err(SceneError::MeshLoad {
                path: GARMENT_MESH_PATH.to_string(),
                reason: error.to_string(),
            });
        }
        // Still pending: nothing is rendered for the garment yet.
        _ => return Ok(()),
    }

    let gltf = gltfs.get(&assets.gltf).ok_or(SceneError::AssetReleased)?;
    let mesh = find_garment_mesh(gltf, &gltf_nodes, &gltf_meshes)?;
    let material = gltf
        .named_materials
        .get(GARMENT_MATERIAL)
        .cloned()
        .ok_or_else(|| SceneError::MissingMaterial {
            path: GARMENT_MESH_PATH.to_string(),
            material: GARMENT_MATERIAL.to_string(),
        })?;

    // Fabric is fully rough.
    if let Some(base) = materials.get_mut(&material) {
        base.perceptual_roughness = 1.0;
    }

    assets.mesh = Some(mesh);
    assets.material = Some(material);
    loading_progress.mesh_resolved = true;
    info!("✓ Garment mesh loaded ({} / {})", GARMENT_MESH_NODE, GARMENT_MATERIAL);
    Ok(())
}

/// Look the shirt up by node name, falling back to a mesh of the same name.
fn find_garment_mesh(
    gltf: &Gltf,
    gltf_nodes: &Assets<GltfNode>,
    gltf_meshes: &Assets<GltfMesh>,
) -> Result<Handle<Mesh>, SceneError> {
    let gltf_mesh = gltf
        .named_nodes
        .get(GARMENT_MESH_NODE)
        .and_then(|node| gltf_nodes.get(node))
        .and_then(|node| node.mesh.clone())
        .or_else(|| gltf.named_meshes.get(GARMENT_MESH_NODE).cloned())
        .ok_or_else(|| SceneError::MissingMeshNode {
            path: GARMENT_MESH_PATH.to_string(),
            node: GARMENT_MESH_NODE.to_string(),
        })?;

    gltf_meshes
        .get(&gltf_mesh)
        .and_then(|mesh| mesh.primitives.first())
        .map(|primitive| primitive.mesh.clone())
        .ok_or_else(|| SceneError::EmptyMeshNode {
            node: GARMENT_MESH_NODE.to_string(),
        })
}
