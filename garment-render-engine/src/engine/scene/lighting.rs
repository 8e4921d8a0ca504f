use bevy::prelude::*;
use constants::render_settings::{AMBIENT_BRIGHTNESS, KEY_LIGHT_ILLUMINANCE};

use crate::engine::garment::components::SceneMember;

pub fn spawn_lighting(mut commands: Commands) {
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });

    // Above and slightly in front so the shirt casts onto the backdrop.
    commands.spawn((
        DirectionalLight {
            illuminance: KEY_LIGHT_ILLUMINANCE,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(0.5, 1.5, 2.0).looking_at(Vec3::ZERO, Vec3::Y),
        SceneMember,
    ));
}
