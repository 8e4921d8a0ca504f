use std::collections::HashMap;

use bevy::prelude::*;
use constants::customizer::{
    FULL_DECAL_ROTATION, FULL_DECAL_SCALE, FULL_DECAL_TRANSLATION, LOGO_DECAL_ROTATION,
    LOGO_DECAL_SCALE, LOGO_DECAL_TRANSLATION,
};

use crate::engine::error::SceneError;
use crate::engine::garment::components::Garment;
use crate::engine::loading::texture_config::DecalTextureSettings;
use crate::engine::loading::texture_loader::DecalTextureRequests;
use crate::engine::mesh::decal_geometry::{DecalProjector, project_decal};
use crate::engine::render::decal_material::{DecalCompositing, DecalMaterial, decal_material};
use crate::engine::store::customization_state::DecalKind;
use crate::engine::store::reactive::{CustomizationStore, SubscriberId};
use crate::rpc::web_rpc::WebRpcInterface;

/// Where a decal sits on the garment, in garment mesh space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalPlacement {
    pub translation: Vec3,
    /// Euler angles, XYZ order.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl DecalPlacement {
    pub fn for_kind(kind: DecalKind) -> Self {
        match kind {
            DecalKind::Full => Self {
                translation: FULL_DECAL_TRANSLATION,
                rotation: FULL_DECAL_ROTATION,
                scale: FULL_DECAL_SCALE,
            },
            DecalKind::Logo => Self {
                translation: LOGO_DECAL_TRANSLATION,
                rotation: LOGO_DECAL_ROTATION,
                scale: LOGO_DECAL_SCALE,
            },
        }
    }

    pub fn projector(&self) -> DecalProjector {
        DecalProjector::new(self.translation, self.rotation, self.scale)
    }
}

/// Identity of a mounted decal. A different key means the decal is torn down
/// and rebuilt rather than updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecalKey(String);

impl DecalKey {
    /// The logo is keyed on its upload flag as well, so re-uploading a file
    /// under a locator seen before still remounts it.
    pub fn new(kind: DecalKind, locator: &str, fresh_upload: bool) -> Self {
        match kind {
            DecalKind::Logo => Self(format!("logo-{locator}-{fresh_upload}")),
            DecalKind::Full => Self(format!("full-{locator}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-layer inputs to [`derive_decal_set`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecalInput {
    pub kind: DecalKind,
    pub enabled: bool,
    pub loaded: bool,
    pub key: DecalKey,
}

/// A decal layer that should currently be mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct DecalLayer {
    pub kind: DecalKind,
    pub key: DecalKey,
    pub placement: DecalPlacement,
    pub compositing: DecalCompositing,
}

/// Decide which decal layers are mounted.
///
/// A layer is present only when the shared gate is open, the layer is enabled,
/// and its own texture loaded. Full is ordered before logo.
pub fn derive_decal_set(ready: bool, inputs: &[DecalInput]) -> Vec<DecalLayer> {
    if !ready {
        return Vec::new();
    }

    DecalKind::ALL
        .iter()
        .filter_map(|kind| inputs.iter().find(|input| input.kind == *kind))
        .filter(|input| input.enabled && input.loaded)
        .map(|input| DecalLayer {
            kind: input.kind,
            key: input.key.clone(),
            placement: DecalPlacement::for_kind(input.kind),
            compositing: DecalCompositing::for_kind(input.kind),
        })
        .collect()
}

/// A mounted decal entity.
#[derive(Component, Debug, Clone)]
pub struct GarmentDecal {
    pub kind: DecalKind,
    pub key: DecalKey,
}

/// Projected decal geometry, built once per garment mesh.
///
/// `None` records a projector that does not touch the garment surface.
#[derive(Resource, Default)]
pub struct DecalMeshes {
    source: Option<AssetId<Mesh>>,
    projected: HashMap<DecalKind, Option<Handle<Mesh>>>,
}

impl DecalMeshes {
    fn get_or_project(
        &mut self,
        kind: DecalKind,
        garment_mesh: &Handle<Mesh>,
        meshes: &mut Assets<Mesh>,
    ) -> Result<Option<Handle<Mesh>>, SceneError> {
        if self.source != Some(garment_mesh.id()) {
            self.projected.clear();
            self.source = Some(garment_mesh.id());
        }
        if let Some(projected) = self.projected.get(&kind) {
            return Ok(projected.clone());
        }

        let garment = meshes.get(garment_mesh).ok_or(SceneError::AssetReleased)?;
        let projected = project_decal(garment, &DecalPlacement::for_kind(kind).projector())?;
        if projected.is_none() {
            warn!("{} decal projector misses the garment surface", kind.as_str());
        }
        let handle = projected.map(|mesh| meshes.add(mesh));
        self.projected.insert(kind, handle.clone());
        Ok(handle)
    }
}

/// Reconcile mounted decal entities with the derived decal set.
///
/// Reruns when any store field it read last time changes or when the texture
/// requests move (a load settling, a new request being issued).
pub fn sync_garment_decals(
    mut commands: Commands,
    mut store: ResMut<CustomizationStore>,
    mut decal_meshes: ResMut<DecalMeshes>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut decal_materials: ResMut<Assets<DecalMaterial>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut subscription: Local<Option<SubscriberId>>,
    mut seen_revision: Local<Option<u64>>,
    requests: Res<DecalTextureRequests>,
    garment: Query<(Entity, &Mesh3d), With<Garment>>,
    mounted: Query<(Entity, &GarmentDecal)>,
) -> Result<(), SceneError> {
    let Ok((garment_entity, garment_mesh)) = garment.single() else {
        return Ok(());
    };

    let id = *subscription.get_or_insert_with(|| store.subscribe("decals"));
    let revision = requests.revision();
    if !store.is_dirty(id) && *seen_revision == Some(revision) {
        return Ok(());
    }
    *seen_revision = Some(revision);

    let inputs = store.track(id, |snap| {
        DecalKind::ALL.map(|kind| {
            let fresh_upload = kind == DecalKind::Logo && snap.fresh_upload();
            DecalInput {
                kind,
                enabled: snap.decal_enabled(kind),
                loaded: requests.is_loaded(kind),
                key: DecalKey::new(kind, snap.decal_image(kind), fresh_upload),
            }
        })
    });
    let layers = derive_decal_set(requests.resources_ready(), &inputs);

    let mut changed = false;
    for (entity, decal) in &mounted {
        let keep = layers
            .iter()
            .any(|layer| layer.kind == decal.kind && layer.key == decal.key);
        if !keep {
            commands.entity(entity).despawn();
            changed = true;
        }
    }

    for layer in &layers {
        let already_mounted = mounted
            .iter()
            .any(|(_, decal)| decal.kind == layer.kind && decal.key == layer.key);
        if already_mounted {
            continue;
        }
        let Some(texture) = requests.loaded_handle(layer.kind) else {
            continue;
        };
        let Some(mesh) = decal_meshes.get_or_project(layer.kind, &garment_mesh.0, &mut meshes)? else {
            continue;
        };

        let settings = DecalTextureSettings::for_kind(layer.kind);
        let material = decal_materials.add(decal_material(layer.kind, texture.clone(), settings.uv_transform()));
        commands.spawn((
            Mesh3d(mesh),
            MeshMaterial3d(material),
            Transform::IDENTITY,
            GarmentDecal {
                kind: layer.kind,
                key: layer.key.clone(),
            },
            ChildOf(garment_entity),
        ));
        debug!("Mounted {} decal {}", layer.kind.as_str(), layer.key.as_str());
        changed = true;
    }

    if changed {
        let present = |kind: DecalKind| layers.iter().any(|layer| layer.kind == kind);
        rpc_interface.send_notification(
            "decals_updated",
            serde_json::json!({
                "logo": present(DecalKind::Logo),
                "full": present(DecalKind::Full),
            }),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bevy::asset::RenderAssetUsages;
    use bevy::render::mesh::{Indices, PrimitiveTopology};

    use super::*;
    use crate::engine::loading::texture_loader::tests::{asset_dir, texture_app, update_until};
    use crate::engine::loading::texture_loader::{TextureRequestKey, poll_decal_texture_loads};
    use crate::engine::scene::crash_boundary::{CrashBoundary, crash_boundary};

    fn input(kind: DecalKind, enabled: bool, loaded: bool) -> DecalInput {
        DecalInput {
            kind,
            enabled,
            loaded,
            key: DecalKey::new(kind, "threejs.png", false),
        }
    }

    fn kinds(layers: &[DecalLayer]) -> Vec<DecalKind> {
        layers.iter().map(|layer| layer.kind).collect()
    }

    #[test]
    fn decal_present_only_when_enabled_and_loaded() {
        for logo_enabled in [false, true] {
            for full_enabled in [false, true] {
                for logo_loaded in [false, true] {
                    for full_loaded in [false, true] {
                        let inputs = [
                            input(DecalKind::Logo, logo_enabled, logo_loaded),
                            input(DecalKind::Full, full_enabled, full_loaded),
                        ];
                        let mut expected = Vec::new();
                        if full_enabled && full_loaded {
                            expected.push(DecalKind::Full);
                        }
                        if logo_enabled && logo_loaded {
                            expected.push(DecalKind::Logo);
                        }

                        assert_eq!(kinds(&derive_decal_set(true, &inputs)), expected);
                        assert!(derive_decal_set(false, &inputs).is_empty());
                    }
                }
            }
        }
    }

    #[test]
    fn decal_set_does_not_depend_on_completion_order() {
        let mut outcomes = Vec::new();
        for logo_first in [true, false] {
            let mut requests = DecalTextureRequests::default();
            let key = |locator: &str| TextureRequestKey {
                locator: locator.to_string(),
                fresh_upload: false,
            };
            let logo = requests.begin(DecalKind::Logo, key("logo.png"), Handle::default());
            let full = requests.begin(DecalKind::Full, key("full.png"), Handle::default());
            if logo_first {
                requests.settle(DecalKind::Logo, logo, Ok(()));
                requests.settle(DecalKind::Full, full, Ok(()));
            } else {
                requests.settle(DecalKind::Full, full, Ok(()));
                requests.settle(DecalKind::Logo, logo, Ok(()));
            }

            let inputs = DecalKind::ALL.map(|kind| input(kind, true, requests.is_loaded(kind)));
            outcomes.push(derive_decal_set(requests.resources_ready(), &inputs));
        }
        assert_eq!(outcomes[0], outcomes[1]);
        assert_eq!(kinds(&outcomes[0]), vec![DecalKind::Full, DecalKind::Logo]);
    }

    #[test]
    fn failed_full_texture_leaves_only_the_logo() {
        let mut requests = DecalTextureRequests::default();
        let key = |locator: &str| TextureRequestKey {
            locator: locator.to_string(),
            fresh_upload: false,
        };
        let logo = requests.begin(DecalKind::Logo, key("logo.png"), Handle::default());
        let full = requests.begin(DecalKind::Full, key("missing.png"), Handle::default());
        requests.settle(DecalKind::Full, full, Err("not found".to_string()));
        requests.settle(DecalKind::Logo, logo, Ok(()));

        let inputs = DecalKind::ALL.map(|kind| input(kind, true, requests.is_loaded(kind)));
        assert_eq!(
            kinds(&derive_decal_set(requests.resources_ready(), &inputs)),
            vec![DecalKind::Logo]
        );
    }

    #[test]
    fn default_state_mounts_nothing() {
        let inputs = DecalKind::ALL.map(|kind| input(kind, false, true));
        assert!(derive_decal_set(true, &inputs).is_empty());
    }

    #[test]
    fn full_layer_composites_without_depth_writes() {
        let inputs = [input(DecalKind::Full, true, true)];
        let layers = derive_decal_set(true, &inputs);
        assert_eq!(layers.len(), 1);
        assert!(layers[0].compositing.depth_test);
        assert!(!layers[0].compositing.depth_write);
        assert_eq!(layers[0].placement.translation, Vec3::ZERO);
        assert_eq!(layers[0].placement.scale, Vec3::ONE);
    }

    #[test]
    fn logo_sits_on_the_chest() {
        let placement = DecalPlacement::for_kind(DecalKind::Logo);
        assert_eq!(placement.translation, Vec3::new(0.0, 0.04, 0.15));
        assert_eq!(placement.scale, Vec3::splat(0.15));
        assert_eq!(placement.projector().rotation, Quat::IDENTITY);
    }

    #[test]
    fn fresh_upload_changes_the_logo_key_for_a_known_locator() {
        let before = DecalKey::new(DecalKind::Logo, "blob:1", false);
        let after = DecalKey::new(DecalKind::Logo, "blob:1", true);
        assert_ne!(before, after);
        assert_eq!(before, DecalKey::new(DecalKind::Logo, "blob:1", false));

        // The full decal ignores the upload flag.
        assert_eq!(
            DecalKey::new(DecalKind::Full, "a.png", false),
            DecalKey::new(DecalKind::Full, "a.png", true)
        );
    }

    /// Square panel at the chest depth, inside both decal boxes.
    fn chest_panel() -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        mesh.insert_attribute(
            Mesh::ATTRIBUTE_POSITION,
            vec![[-0.4, -0.4, 0.15], [0.4, -0.4, 0.15], [0.4, 0.4, 0.15], [-0.4, 0.4, 0.15]],
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 0.0, 1.0]; 4]);
        mesh.insert_indices(Indices::U32(vec![0, 1, 2, 0, 2, 3]));
        mesh
    }

    fn decal_app(name: &str) -> App {
        let mut app = texture_app(&asset_dir(name));
        app.init_asset::<Mesh>()
            .init_asset::<DecalMaterial>()
            .init_resource::<DecalMeshes>()
            .init_resource::<CrashBoundary>()
            .add_systems(
                Update,
                sync_garment_decals
                    .pipe(crash_boundary("GarmentDecals"))
                    .after(poll_decal_texture_loads),
            );

        let panel = app.world_mut().resource_mut::<Assets<Mesh>>().add(chest_panel());
        app.world_mut().spawn((Mesh3d(panel), Transform::default(), Garment));
        app
    }

    fn mounted(world: &mut World) -> Vec<(Entity, DecalKind, DecalKey)> {
        let mut decals: Vec<_> = world
            .query::<(Entity, &GarmentDecal)>()
            .iter(world)
            .map(|(entity, decal)| (entity, decal.kind, decal.key.clone()))
            .collect();
        decals.sort_by_key(|(_, kind, _)| kind.as_str());
        decals
    }

    fn mounted_kinds(world: &mut World) -> Vec<DecalKind> {
        mounted(world).into_iter().map(|(_, kind, _)| kind).collect()
    }

    #[test]
    fn mounted_decals_follow_settled_loads() {
        let mut app = decal_app("mounted-decals");
        {
            let mut store = app.world_mut().resource_mut::<CustomizationStore>();
            store.set_decal_enabled(DecalKind::Logo, true);
            store.set_decal_enabled(DecalKind::Full, true);
        }

        assert!(update_until(&mut app, |world| {
            mounted_kinds(world) == vec![DecalKind::Full, DecalKind::Logo]
        }));
        assert!(!app.world().resource::<CrashBoundary>().is_crashed());

        app.world_mut()
            .resource_mut::<CustomizationStore>()
            .set_decal_enabled(DecalKind::Full, false);
        app.update();
        assert_eq!(mounted_kinds(app.world_mut()), vec![DecalKind::Logo]);

        let updates: Vec<_> = app
            .world()
            .resource::<WebRpcInterface>()
            .pending_notifications()
            .iter()
            .filter(|n| n.method == "decals_updated")
            .map(|n| (n.params["full"].clone(), n.params["logo"].clone()))
            .collect();
        assert_eq!(
            updates.last(),
            Some(&(serde_json::json!(false), serde_json::json!(true)))
        );
    }

    #[test]
    fn new_upload_replaces_the_logo_entity() {
        let mut app = decal_app("logo-remount");
        {
            let mut store = app.world_mut().resource_mut::<CustomizationStore>();
            store.set_decal_enabled(DecalKind::Logo, true);
            store.set_decal_enabled(DecalKind::Full, true);
        }
        assert!(update_until(&mut app, |world| mounted(world).len() == 2));
        let before = mounted(app.world_mut());

        let upload = "blob:http://localhost:5173/0b6c1d2e-uuid";
        {
            let mut store = app.world_mut().resource_mut::<CustomizationStore>();
            store.set_decal_image(DecalKind::Logo, upload);
            store.set_fresh_upload(true);
        }
        let expected = DecalKey::new(DecalKind::Logo, upload, true);
        assert!(update_until(&mut app, |world| {
            mounted(world)
                .iter()
                .any(|(_, kind, key)| *kind == DecalKind::Logo && *key == expected)
        }));

        let after = mounted(app.world_mut());
        assert_eq!(after.len(), 2);
        let old_logo = before.iter().find(|(_, kind, _)| *kind == DecalKind::Logo).unwrap().0;
        let new_logo = after.iter().find(|(_, kind, _)| *kind == DecalKind::Logo).unwrap().0;
        assert_ne!(old_logo, new_logo);
        assert!(app.world().get_entity(old_logo).is_err());

        // The full decal's key did not change, so it stays mounted as is.
        let old_full = before.iter().find(|(_, kind, _)| *kind == DecalKind::Full).unwrap().0;
        let new_full = after.iter().find(|(_, kind, _)| *kind == DecalKind::Full).unwrap().0;
        assert_eq!(old_full, new_full);
    }
}
