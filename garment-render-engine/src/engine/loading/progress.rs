use bevy::prelude::*;

#[derive(Resource, Default, Debug)]
pub struct LoadingProgress {
    pub mesh_requested: bool,
    pub mesh_resolved: bool,
    pub garment_spawned: bool,
}
