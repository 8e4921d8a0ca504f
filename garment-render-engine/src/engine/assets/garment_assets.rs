use bevy::gltf::Gltf;
use bevy::prelude::*;

/// Handles for the garment mesh asset.
///
/// `gltf` is requested at startup. `mesh` and `material` are filled in once the
/// named node and material have been found inside it.
#[derive(Resource, Default)]
pub struct GarmentAssets {
    pub gltf: Handle<Gltf>,
    pub mesh: Option<Handle<Mesh>>,
    pub material: Option<Handle<StandardMaterial>>,
}

impl GarmentAssets {
    /// Mesh and material once both are resolved.
    pub fn resolved(&self) -> Option<(&Handle<Mesh>, &Handle<StandardMaterial>)> {
        Some((self.mesh.as_ref()?, self.material.as_ref()?))
    }
}
