use bevy::prelude::*;
use constants::render_settings::CRASH_FALLBACK_MESSAGE;

use crate::engine::core::app_state::AppState;
use crate::engine::error::SceneError;
use crate::engine::garment::components::SceneMember;
use crate::rpc::web_rpc::WebRpcInterface;

/// A fatal scene error and the system it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCrash {
    pub context: &'static str,
    pub error: SceneError,
}

/// Holds the first fatal error raised by any garment system.
///
/// Later errors are logged but do not replace the first one. There is no
/// recovery: once crashed the scene stays down until the page reloads.
#[derive(Resource, Debug, Default)]
pub struct CrashBoundary {
    crash: Option<SceneCrash>,
    fallback_shown: bool,
}

impl CrashBoundary {
    /// Record `result` from the system named `context`. True if it was an error.
    pub fn capture(&mut self, context: &'static str, result: Result<(), SceneError>) -> bool {
        let Err(error) = result else {
            return false;
        };
        error!("{} crashed: {}", context, error);
        if self.crash.is_none() {
            self.crash = Some(SceneCrash { context, error });
        }
        true
    }

    pub fn crash(&self) -> Option<&SceneCrash> {
        self.crash.as_ref()
    }

    pub fn is_crashed(&self) -> bool {
        self.crash.is_some()
    }
}

/// Pipe target for fallible garment systems.
///
/// ```rust,ignore
/// app.add_systems(Update, resolve_garment_mesh.pipe(crash_boundary("GarmentMesh")));
/// ```
pub fn crash_boundary(
    context: &'static str,
) -> impl FnMut(In<Result<(), SceneError>>, ResMut<CrashBoundary>) {
    move |In(result), mut boundary| {
        boundary.capture(context, result);
    }
}

/// Root of the fallback message UI.
#[derive(Component, Debug)]
pub struct CrashFallback;

/// Replace the scene with the fallback message once something has crashed.
pub fn show_crash_fallback(
    mut commands: Commands,
    mut boundary: ResMut<CrashBoundary>,
    mut next_state: ResMut<NextState<AppState>>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    scene: Query<Entity, With<SceneMember>>,
) {
    if boundary.fallback_shown {
        return;
    }
    let Some(crash) = boundary.crash.clone() else {
        return;
    };

    for entity in &scene {
        commands.entity(entity).try_despawn();
    }

    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                padding: UiRect::all(Val::Px(16.0)),
                ..default()
            },
            CrashFallback,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(CRASH_FALLBACK_MESSAGE),
                TextFont {
                    font_size: 16.0,
                    ..default()
                },
                TextLayout::new_with_justify(JustifyText::Center),
            ));
        });

    rpc_interface.send_notification(
        "viewer_crashed",
        serde_json::json!({
            "context": crash.context,
            "error": crash.error.to_string(),
        }),
    );
    next_state.set(AppState::Crashed);
    boundary.fallback_shown = true;
    info!("Scene replaced with fallback message");
}
