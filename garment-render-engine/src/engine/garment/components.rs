use bevy::prelude::*;

/// Parent that holds the garment at the origin.
#[derive(Component, Debug, Default)]
pub struct GarmentCentre;

/// The shirt mesh entity. Decals are spawned as its children.
#[derive(Component, Debug, Default)]
pub struct Garment;

/// Anything that belongs to the 3D scene and must be torn down on a crash.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct SceneMember;
