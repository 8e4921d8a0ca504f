use bevy::prelude::*;

use crate::engine::loading::progress::LoadingProgress;

/// Scene lifecycle. RPC and the store keep running in every state.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    /// Garment mesh pending. Nothing is drawn for the garment yet.
    #[default]
    Loading,
    /// Garment spawned; decals and damping are live.
    Running,
    /// A fatal scene error replaced the scene with the fallback message.
    Crashed,
}

pub fn transition_to_running(
    loading_progress: Res<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if loading_progress.garment_spawned {
        info!("→ Transitioning to Running state");
        next_state.set(AppState::Running);
    }
}
