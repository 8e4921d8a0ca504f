use bevy::asset::{AssetLoadFailedEvent, LoadState};
use bevy::prelude::*;

use crate::engine::loading::remote_image::{
    ImageBytes, RemoteImageFetcher, RemoteImageInbox, RemoteImageRequest, decode_image,
    is_remote_locator,
};
use crate::engine::loading::texture_config::configure_decal_texture;
use crate::engine::store::customization_state::DecalKind;
use crate::engine::store::reactive::{CustomizationStore, SubscriberId};
use crate::rpc::web_rpc::WebRpcInterface;

/// Identifies one texture request. Generations only ever increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// What a request is for. A fresh upload re-requests even when the locator
/// string is unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequestKey {
    pub locator: String,
    pub fresh_upload: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureStatus {
    Pending,
    Loaded,
    Failed(String),
}

impl TextureStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, TextureStatus::Pending)
    }
}

/// Result of handing a completion to [`DecalTextureRequests::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Accepted,
    /// The slot has moved on to a newer request; the completion was dropped.
    Stale,
}

/// How the outcome of an in-flight load is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadWatch {
    /// Poll the asset server's load state.
    LoadState,
    /// Reload of a path the server already holds. The handle keeps answering
    /// `Loaded` with the old image, so only the server's completion or failure
    /// event for it counts, and only events seen after the request frame.
    Reload { armed: bool },
    /// Bytes fetched by the browser and delivered through [`RemoteImageInbox`].
    Remote,
}

#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub key: TextureRequestKey,
    pub token: RequestToken,
    pub handle: Handle<Image>,
    pub status: TextureStatus,
}

/// A load that has been issued and not yet observed to finish. Superseded loads
/// stay here until they settle so their late results can be discarded.
#[derive(Debug, Clone)]
pub struct InFlightLoad {
    pub kind: DecalKind,
    pub token: RequestToken,
    pub handle: Handle<Image>,
    pub watch: LoadWatch,
}

/// Current logo/full texture requests and the loads still in flight.
#[derive(Resource, Default, Debug)]
pub struct DecalTextureRequests {
    logo: Option<SlotRequest>,
    full: Option<SlotRequest>,
    in_flight: Vec<InFlightLoad>,
    next_generation: u64,
    // Bumped on every begin/accepted settle so consumers can cheaply spot changes.
    revision: u64,
}

impl DecalTextureRequests {
    fn slot(&self, kind: DecalKind) -> Option<&SlotRequest> {
        match kind {
            DecalKind::Logo => self.logo.as_ref(),
            DecalKind::Full => self.full.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: DecalKind) -> &mut Option<SlotRequest> {
        match kind {
            DecalKind::Logo => &mut self.logo,
            DecalKind::Full => &mut self.full,
        }
    }

    pub fn current(&self, kind: DecalKind) -> Option<&SlotRequest> {
        self.slot(kind)
    }

    /// Whether `key` differs from what the slot last requested.
    pub fn needs_request(&self, kind: DecalKind, key: &TextureRequestKey) -> bool {
        self.slot(kind).is_none_or(|request| request.key != *key)
    }

    /// Start a new request for `kind` settled from the asset server's load state.
    pub fn begin(&mut self, kind: DecalKind, key: TextureRequestKey, handle: Handle<Image>) -> RequestToken {
        self.begin_with(kind, key, handle, LoadWatch::LoadState)
    }

    /// Start a new request for `kind`, superseding whatever the slot held.
    pub fn begin_with(
        &mut self,
        kind: DecalKind,
        key: TextureRequestKey,
        handle: Handle<Image>,
        watch: LoadWatch,
    ) -> RequestToken {
        self.next_generation += 1;
        let token = RequestToken(self.next_generation);

        self.in_flight.push(InFlightLoad {
            kind,
            token,
            handle: handle.clone(),
            watch,
        });
        *self.slot_mut(kind) = Some(SlotRequest {
            key,
            token,
            handle,
            status: TextureStatus::Pending,
        });
        self.revision += 1;
        token
    }

    /// Record the outcome of the load issued with `token`.
    ///
    /// Only the slot's current token is accepted. Anything else belongs to a
    /// superseded locator and must not touch the slot.
    pub fn settle(&mut self, kind: DecalKind, token: RequestToken, outcome: Result<(), String>) -> Settlement {
        self.in_flight
            .retain(|load| !(load.kind == kind && load.token == token));

        let Some(request) = self.slot_mut(kind).as_mut() else {
            return Settlement::Stale;
        };
        if request.token != token || request.status.is_settled() {
            return Settlement::Stale;
        }

        request.status = match outcome {
            Ok(()) => TextureStatus::Loaded,
            Err(reason) => TextureStatus::Failed(reason),
        };
        self.revision += 1;
        Settlement::Accepted
    }

    pub fn in_flight(&self) -> &[InFlightLoad] {
        &self.in_flight
    }

    /// Let reloads issued before this point react to asset events.
    pub fn arm_reloads(&mut self) {
        for load in &mut self.in_flight {
            if let LoadWatch::Reload { armed } = &mut load.watch {
                *armed = true;
            }
        }
    }

    /// True once both slots have a request and neither is still pending.
    ///
    /// A failed slot counts as settled: it keeps its own decal hidden without
    /// holding back the other one.
    pub fn resources_ready(&self) -> bool {
        DecalKind::ALL.iter().all(|kind| {
            self.slot(*kind)
                .is_some_and(|request| request.status.is_settled())
        })
    }

    pub fn is_loaded(&self, kind: DecalKind) -> bool {
        self.slot(kind)
            .is_some_and(|request| request.status == TextureStatus::Loaded)
    }

    pub fn loaded_handle(&self, kind: DecalKind) -> Option<&Handle<Image>> {
        self.slot(kind)
            .filter(|request| request.status == TextureStatus::Loaded)
            .map(|request| &request.handle)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Re-issue decal texture requests whenever a locator (or the fresh-upload flag)
/// changes in the store.
pub fn request_decal_textures(
    mut store: ResMut<CustomizationStore>,
    mut requests: ResMut<DecalTextureRequests>,
    mut subscription: Local<Option<SubscriberId>>,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    fetcher: Res<RemoteImageFetcher>,
    inbox: Res<RemoteImageInbox>,
) {
    let id = *subscription.get_or_insert_with(|| store.subscribe("decal_textures"));
    if !store.is_dirty(id) {
        return;
    }

    let keys = store.track(id, |snap| {
        DecalKind::ALL.map(|kind| {
            let fresh_upload = kind == DecalKind::Logo && snap.fresh_upload();
            (
                kind,
                TextureRequestKey {
                    locator: snap.decal_image(kind).to_string(),
                    fresh_upload,
                },
            )
        })
    });

    for (kind, key) in keys {
        if !requests.needs_request(kind, &key) {
            continue;
        }

        let token = if is_remote_locator(&key.locator) {
            let token = requests.begin_with(kind, key.clone(), images.reserve_handle(), LoadWatch::Remote);
            (fetcher.0)(
                RemoteImageRequest {
                    kind,
                    token,
                    locator: key.locator.clone(),
                },
                inbox.clone(),
            );
            token
        } else {
            let handle: Handle<Image> = asset_server.load(key.locator.clone());
            // A new upload under a cached path: make the server read it again.
            let watch = if key.fresh_upload
                && matches!(asset_server.get_load_state(&handle), Some(LoadState::Loaded))
            {
                asset_server.reload(key.locator.clone());
                LoadWatch::Reload { armed: false }
            } else {
                LoadWatch::LoadState
            };
            requests.begin_with(kind, key.clone(), handle, watch)
        };

        debug!(
            "Requested {} decal texture {} ({:?})",
            kind.as_str(),
            key.locator,
            token
        );
    }
}

enum Completion {
    Ready,
    Fetched(ImageBytes),
    Failed(String),
}

/// Observe finished loads and settle them against their tokens.
pub fn poll_decal_texture_loads(
    mut requests: ResMut<DecalTextureRequests>,
    mut images: ResMut<Assets<Image>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut asset_events: EventReader<AssetEvent<Image>>,
    mut failed_events: EventReader<AssetLoadFailedEvent<Image>>,
    asset_server: Res<AssetServer>,
    inbox: Res<RemoteImageInbox>,
) {
    // Read every frame so a reload never sees events from before it was issued.
    let reloaded: Vec<AssetId<Image>> = asset_events
        .read()
        .filter_map(|event| match event {
            AssetEvent::LoadedWithDependencies { id } => Some(*id),
            _ => None,
        })
        .collect();
    let reload_failures: Vec<(AssetId<Image>, String)> = failed_events
        .read()
        .map(|event| (event.id, event.error.to_string()))
        .collect();
    let mut fetched = inbox.drain();

    let mut finished: Vec<(InFlightLoad, Completion)> = Vec::new();
    for load in requests.in_flight() {
        let completion = match load.watch {
            LoadWatch::LoadState => match asset_server.get_load_state(&load.handle) {
                Some(LoadState::Loaded) => Some(Completion::Ready),
                Some(LoadState::Failed(error)) => Some(Completion::Failed(error.to_string())),
                _ => None,
            },
            LoadWatch::Reload { armed: false } => None,
            LoadWatch::Reload { armed: true } => {
                let id = load.handle.id();
                if let Some((_, error)) = reload_failures.iter().find(|(failed, _)| *failed == id) {
                    Some(Completion::Failed(error.clone()))
                } else if reloaded.contains(&id) {
                    Some(Completion::Ready)
                } else {
                    None
                }
            }
            LoadWatch::Remote => fetched
                .iter()
                .position(|image| image.kind == load.kind && image.token == load.token)
                .map(|index| match fetched.swap_remove(index).result {
                    Ok(bytes) => Completion::Fetched(bytes),
                    Err(reason) => Completion::Failed(reason),
                }),
        };
        if let Some(completion) = completion {
            finished.push((load.clone(), completion));
        }
    }
    for orphan in fetched {
        debug!("Dropped remote image for unknown request {:?}", orphan.token);
    }

    for (load, completion) in finished {
        let is_current = requests
            .current(load.kind)
            .is_some_and(|request| request.token == load.token);
        // Superseded loads are never decoded or configured.
        let outcome = if is_current {
            complete_load(completion, &load, &mut images)
        } else {
            Err("superseded".to_string())
        };

        let locator = requests
            .current(load.kind)
            .map(|request| request.key.locator.clone())
            .unwrap_or_default();

        match (requests.settle(load.kind, load.token, outcome.clone()), outcome) {
            (Settlement::Accepted, Ok(())) => {
                info!("✓ {} decal texture ready: {}", load.kind.as_str(), locator);
            }
            (Settlement::Accepted, Err(reason)) => {
                error!(
                    "Error loading {} decal texture {}: {}",
                    load.kind.as_str(),
                    locator,
                    reason
                );
                rpc_interface.send_notification(
                    "texture_load_failed",
                    serde_json::json!({
                        "decal": load.kind.as_str(),
                        "locator": locator,
                        "error": reason,
                    }),
                );
            }
            (Settlement::Stale, _) => {
                debug!(
                    "Discarded stale {} decal texture completion ({:?})",
                    load.kind.as_str(),
                    load.token
                );
            }
        }
    }

    requests.arm_reloads();
}

// Configure before accepting so a Loaded slot is always ready to draw.
fn complete_load(completion: Completion, load: &InFlightLoad, images: &mut Assets<Image>) -> Result<(), String> {
    match completion {
        Completion::Failed(reason) => return Err(reason),
        Completion::Fetched(bytes) => images.insert(&load.handle, decode_image(&bytes)?),
        Completion::Ready => {}
    }
    if configure_decal_texture(images, &load.handle, load.kind) {
        Ok(())
    } else {
        Err("texture was released before it could be configured".to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use bevy::asset::AssetMetaCheck;
    use bevy::image::ImageSampler;

    use super::*;
    use crate::engine::loading::remote_image::FetchedImage;
    use crate::engine::loading::remote_image::tests::RED_PNG;

    fn key(locator: &str) -> TextureRequestKey {
        TextureRequestKey {
            locator: locator.to_string(),
            fresh_upload: false,
        }
    }

    #[test]
    fn ready_only_after_both_requests_settle_in_either_order() {
        for logo_first in [true, false] {
            let mut requests = DecalTextureRequests::default();
            let logo = requests.begin(DecalKind::Logo, key("logo.png"), Handle::default());
            let full = requests.begin(DecalKind::Full, key("full.png"), Handle::default());
            assert!(!requests.resources_ready());

            let (first, second) = if logo_first {
                ((DecalKind::Logo, logo), (DecalKind::Full, full))
            } else {
                ((DecalKind::Full, full), (DecalKind::Logo, logo))
            };
            requests.settle(first.0, first.1, Ok(()));
            assert!(!requests.resources_ready());
            requests.settle(second.0, second.1, Ok(()));
            assert!(requests.resources_ready());
            assert!(requests.in_flight().is_empty());
        }
    }

    #[test]
    fn failed_slot_settles_but_is_not_loaded() {
        let mut requests = DecalTextureRequests::default();
        let logo = requests.begin(DecalKind::Logo, key("logo.png"), Handle::default());
        let full = requests.begin(DecalKind::Full, key("missing.png"), Handle::default());

        requests.settle(DecalKind::Full, full, Err("404".to_string()));
        requests.settle(DecalKind::Logo, logo, Ok(()));

        assert!(requests.resources_ready());
        assert!(requests.is_loaded(DecalKind::Logo));
        assert!(!requests.is_loaded(DecalKind::Full));
        assert!(requests.loaded_handle(DecalKind::Full).is_none());
    }

    #[test]
    fn late_completion_for_superseded_locator_is_discarded() {
        let mut requests = DecalTextureRequests::default();
        let full = requests.begin(DecalKind::Full, key("full.png"), Handle::default());
        requests.settle(DecalKind::Full, full, Ok(()));

        let old = requests.begin(DecalKind::Logo, key("old.png"), Handle::default());
        let new = requests.begin(DecalKind::Logo, key("new.png"), Handle::default());
        assert_eq!(requests.in_flight().len(), 2);

        let revision = requests.revision();
        assert_eq!(requests.settle(DecalKind::Logo, old, Ok(())), Settlement::Stale);
        assert!(!requests.resources_ready());
        assert!(!requests.is_loaded(DecalKind::Logo));
        assert_eq!(requests.revision(), revision);

        assert_eq!(requests.settle(DecalKind::Logo, new, Ok(())), Settlement::Accepted);
        assert!(requests.resources_ready());
        assert_eq!(requests.current(DecalKind::Logo).unwrap().key.locator, "new.png");
    }

    #[test]
    fn settling_twice_is_stale() {
        let mut requests = DecalTextureRequests::default();
        let token = requests.begin(DecalKind::Logo, key("logo.png"), Handle::default());
        assert_eq!(requests.settle(DecalKind::Logo, token, Ok(())), Settlement::Accepted);
        assert_eq!(
            requests.settle(DecalKind::Logo, token, Err("late".to_string())),
            Settlement::Stale
        );
        assert!(requests.is_loaded(DecalKind::Logo));
    }

    #[test]
    fn fresh_upload_with_same_locator_needs_a_new_request() {
        let mut requests = DecalTextureRequests::default();
        requests.begin(DecalKind::Logo, key("blob-1"), Handle::default());

        assert!(!requests.needs_request(DecalKind::Logo, &key("blob-1")));
        let fresh = TextureRequestKey {
            locator: "blob-1".to_string(),
            fresh_upload: true,
        };
        assert!(requests.needs_request(DecalKind::Logo, &fresh));
    }

    /// Fresh asset directory holding the default decal image.
    pub(crate) fn asset_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("garment-engine-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("threejs.png"), RED_PNG).unwrap();
        dir
    }

    // Stands in for the browser: every fetch returns the same PNG immediately.
    fn serve_red_png(request: RemoteImageRequest, inbox: RemoteImageInbox) {
        inbox.deliver(FetchedImage {
            kind: request.kind,
            token: request.token,
            result: Ok(ImageBytes {
                bytes: RED_PNG.to_vec(),
                mime_type: Some("image/png".to_string()),
            }),
        });
    }

    /// App running the decal texture systems against real image loads from `dir`.
    pub(crate) fn texture_app(dir: &Path) -> App {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            AssetPlugin {
                file_path: dir.to_string_lossy().into_owned(),
                meta_check: AssetMetaCheck::Never,
                ..default()
            },
            ImagePlugin::default(),
        ))
        .init_resource::<CustomizationStore>()
        .init_resource::<DecalTextureRequests>()
        .init_resource::<WebRpcInterface>()
        .init_resource::<RemoteImageInbox>()
        .insert_resource(RemoteImageFetcher(serve_red_png))
        .add_systems(Update, (request_decal_textures, poll_decal_texture_loads).chain());
        app.finish();
        app
    }

    pub(crate) fn update_until(app: &mut App, mut done: impl FnMut(&mut World) -> bool) -> bool {
        for _ in 0..500 {
            app.update();
            if done(app.world_mut()) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    fn store(app: &mut App) -> Mut<'_, CustomizationStore> {
        app.world_mut().resource_mut::<CustomizationStore>()
    }

    fn logo_status(world: &World) -> Option<TextureStatus> {
        world
            .resource::<DecalTextureRequests>()
            .current(DecalKind::Logo)
            .map(|request| request.status.clone())
    }

    fn failure_notifications(world: &World, decal: &str) -> usize {
        world
            .resource::<WebRpcInterface>()
            .pending_notifications()
            .iter()
            .filter(|n| n.method == "texture_load_failed" && n.params["decal"] == decal)
            .count()
    }

    #[test]
    fn uploaded_object_url_loads_through_the_browser_fetch() {
        let dir = asset_dir("object-url");
        let mut app = texture_app(&dir);
        store(&mut app).set_decal_image(DecalKind::Logo, "blob:http://localhost:5173/0b6c1d2e-uuid");
        store(&mut app).set_fresh_upload(true);

        assert!(update_until(&mut app, |world| {
            world.resource::<DecalTextureRequests>().resources_ready()
        }));

        assert_eq!(logo_status(app.world()), Some(TextureStatus::Loaded));
        let requests = app.world().resource::<DecalTextureRequests>();
        let handle = requests.loaded_handle(DecalKind::Logo).unwrap();
        let image = app.world().resource::<Assets<Image>>().get(handle).unwrap();
        assert_eq!(image.width(), 2);
        assert!(requests.is_loaded(DecalKind::Full));
    }

    #[test]
    fn object_url_without_a_browser_fails_the_slot_and_reports_it() {
        let dir = asset_dir("object-url-native");
        let mut app = texture_app(&dir);
        app.insert_resource(RemoteImageFetcher::default());
        store(&mut app).set_decal_image(DecalKind::Logo, "blob:http://localhost:5173/0b6c1d2e-uuid");

        assert!(update_until(&mut app, |world| {
            world.resource::<DecalTextureRequests>().resources_ready()
        }));

        assert!(matches!(logo_status(app.world()), Some(TextureStatus::Failed(_))));
        assert_eq!(failure_notifications(app.world(), "logo"), 1);
    }

    #[test]
    fn reupload_under_a_loaded_path_waits_for_the_reload() {
        let dir = asset_dir("reupload-ok");
        std::fs::write(dir.join("logo.png"), RED_PNG).unwrap();
        let mut app = texture_app(&dir);
        store(&mut app).set_decal_image(DecalKind::Logo, "logo.png");
        assert!(update_until(&mut app, |world| {
            world.resource::<DecalTextureRequests>().resources_ready()
        }));
        let first = app.world().resource::<DecalTextureRequests>().current(DecalKind::Logo).unwrap().token;

        store(&mut app).set_fresh_upload(true);
        app.update();

        let requests = app.world().resource::<DecalTextureRequests>();
        let current = requests.current(DecalKind::Logo).unwrap();
        assert_ne!(current.token, first);
        assert_eq!(current.status, TextureStatus::Pending);
        assert!(!requests.resources_ready());

        assert!(update_until(&mut app, |world| {
            logo_status(world).is_some_and(|status| status.is_settled())
        }));
        assert_eq!(logo_status(app.world()), Some(TextureStatus::Loaded));
    }

    #[test]
    fn failed_reupload_under_a_loaded_path_is_reported() {
        let dir = asset_dir("reupload-broken");
        std::fs::write(dir.join("logo.png"), RED_PNG).unwrap();
        let mut app = texture_app(&dir);
        store(&mut app).set_decal_image(DecalKind::Logo, "logo.png");
        assert!(update_until(&mut app, |world| {
            world.resource::<DecalTextureRequests>().resources_ready()
        }));

        std::fs::write(dir.join("logo.png"), b"definitely not a png").unwrap();
        store(&mut app).set_fresh_upload(true);
        app.update();
        assert_eq!(logo_status(app.world()), Some(TextureStatus::Pending));

        assert!(update_until(&mut app, |world| {
            logo_status(world).is_some_and(|status| status.is_settled())
        }));
        assert!(matches!(logo_status(app.world()), Some(TextureStatus::Failed(_))));
        assert!(
            app.world()
                .resource::<DecalTextureRequests>()
                .loaded_handle(DecalKind::Logo)
                .is_none()
        );
        assert_eq!(failure_notifications(app.world(), "logo"), 1);
    }

    #[test]
    fn superseded_texture_is_never_configured() {
        let dir = asset_dir("superseded");
        std::fs::write(dir.join("a.png"), RED_PNG).unwrap();
        std::fs::write(dir.join("b.png"), RED_PNG).unwrap();
        let mut app = texture_app(&dir);

        store(&mut app).set_decal_image(DecalKind::Full, "a.png");
        app.update();
        let superseded = app
            .world()
            .resource::<DecalTextureRequests>()
            .current(DecalKind::Full)
            .unwrap()
            .handle
            .clone();

        store(&mut app).set_decal_image(DecalKind::Full, "b.png");
        assert!(update_until(&mut app, |world| {
            let requests = world.resource::<DecalTextureRequests>();
            requests.resources_ready() && requests.in_flight().is_empty()
        }));

        let requests = app.world().resource::<DecalTextureRequests>();
        let current = requests.current(DecalKind::Full).unwrap();
        assert_eq!(current.key.locator, "b.png");
        assert_eq!(current.status, TextureStatus::Loaded);

        let images = app.world().resource::<Assets<Image>>();
        assert!(matches!(images.get(&superseded).unwrap().sampler, ImageSampler::Default));
        assert!(matches!(
            images.get(&current.handle).unwrap().sampler,
            ImageSampler::Descriptor(_)
        ));
    }
}
