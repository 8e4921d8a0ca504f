use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{RenderCreation, WgpuSettings};
use constants::render_settings::RENDER_SURFACE;

use crate::engine::assets::garment_assets::GarmentAssets;
use crate::engine::core::app_state::{AppState, transition_to_running};
use crate::engine::core::window_config::create_window_config;
use crate::engine::garment::decals::{DecalMeshes, sync_garment_decals};
use crate::engine::loading::garment_creator::spawn_garment_when_ready;
use crate::engine::loading::mesh_loader::{preload_garment_mesh, resolve_garment_mesh};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::remote_image::{RemoteImageFetcher, RemoteImageInbox};
use crate::engine::loading::texture_loader::{
    DecalTextureRequests, poll_decal_texture_loads, request_decal_textures,
};
use crate::engine::render::decal_material::DecalMaterialPlugin;
use crate::engine::scene::backdrop::spawn_backdrop;
use crate::engine::scene::camera_rig::{spawn_camera_rig, update_camera_rig};
use crate::engine::scene::crash_boundary::{CrashBoundary, crash_boundary, show_crash_fallback};
use crate::engine::scene::lighting::spawn_lighting;
use crate::engine::store::reactive::CustomizationStore;
use crate::engine::systems::colour_damping::{BaseColourDamper, damp_garment_colour};
use crate::rpc::web_rpc::{RpcSystems, WebRpcPlugin};

/// Everything that can fail into the crash boundary.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GarmentSystems;

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(DecalMaterialPlugin)
        .add_plugins(WebRpcPlugin);

    app.init_resource::<LoadingProgress>()
        .init_resource::<GarmentAssets>()
        .init_resource::<CustomizationStore>()
        .init_resource::<DecalTextureRequests>()
        .init_resource::<RemoteImageInbox>()
        .init_resource::<RemoteImageFetcher>()
        .init_resource::<DecalMeshes>()
        .init_resource::<BaseColourDamper>()
        .init_resource::<CrashBoundary>();

    app.add_systems(
        Startup,
        (
            preload_garment_mesh,
            spawn_lighting,
            (spawn_camera_rig, spawn_backdrop).chain(),
        ),
    );

    // Loading: wait for the mesh, then spawn the garment.
    app.add_systems(
        Update,
        (
            resolve_garment_mesh.pipe(crash_boundary("GarmentMesh")),
            spawn_garment_when_ready.pipe(crash_boundary("Garment")),
            transition_to_running,
        )
            .chain()
            .in_set(GarmentSystems)
            .run_if(in_state(AppState::Loading)),
    );

    // Fixed per-frame order: state read, load completions, colour, decal set.
    app.add_systems(
        Update,
        (
            (request_decal_textures, poll_decal_texture_loads)
                .chain()
                .run_if(not(in_state(AppState::Crashed))),
            (
                damp_garment_colour,
                sync_garment_decals.pipe(crash_boundary("GarmentDecals")),
            )
                .chain()
                .run_if(in_state(AppState::Running)),
        )
            .chain()
            .in_set(GarmentSystems),
    );

    app.configure_sets(Update, GarmentSystems.after(RpcSystems));

    app.add_systems(
        Update,
        update_camera_rig
            .after(RpcSystems)
            .run_if(not(in_state(AppState::Crashed))),
    );

    // Runs in every state so a crash in any garment system is surfaced.
    app.add_systems(Update, show_crash_fallback.after(GarmentSystems));

    app
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let render_config = RenderPlugin {
        render_creation: RenderCreation::Automatic(WgpuSettings {
            power_preference: RENDER_SURFACE.power_preference,
            ..default()
        }),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(render_config)
}
