use bevy::color::HexColorError;
use bevy::prelude::*;
use constants::customizer::DEFAULT_BASE_COLOUR;

use crate::engine::assets::garment_assets::GarmentAssets;
use crate::engine::store::reactive::{CustomizationStore, SubscriberId};
use crate::engine::systems::smooth_damp::SmoothDamp;

/// Target colour for the garment material and the damping state toward it.
///
/// Damping runs per channel in linear space.
#[derive(Resource, Debug)]
pub struct BaseColourDamper {
    target: LinearRgba,
    damp: SmoothDamp<3>,
}

impl Default for BaseColourDamper {
    fn default() -> Self {
        let target = Srgba::hex(DEFAULT_BASE_COLOUR).map_or(LinearRgba::WHITE, LinearRgba::from);
        Self {
            target,
            damp: SmoothDamp::default(),
        }
    }
}

impl BaseColourDamper {
    pub fn target(&self) -> LinearRgba {
        self.target
    }

    /// Parse `hex` and aim at it. An unparsable colour leaves the previous
    /// target in place.
    pub fn retarget(&mut self, hex: &str) -> Result<(), HexColorError> {
        self.target = Srgba::hex(hex)?.into();
        Ok(())
    }

    /// One damping step from `current`. `None` once it sits on the target.
    pub fn advance(&mut self, current: LinearRgba, delta: f32) -> Option<LinearRgba> {
        let mut channels = [current.red, current.green, current.blue];
        let target = [self.target.red, self.target.green, self.target.blue];
        if channels == target {
            return None;
        }
        self.damp.step(&mut channels, target, delta);
        Some(LinearRgba::new(channels[0], channels[1], channels[2], current.alpha))
    }
}

/// Ease the garment material's base colour toward the store's colour.
pub fn damp_garment_colour(
    mut store: ResMut<CustomizationStore>,
    mut damper: ResMut<BaseColourDamper>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut subscription: Local<Option<SubscriberId>>,
    garment_assets: Res<GarmentAssets>,
    time: Res<Time>,
) {
    let id = *subscription.get_or_insert_with(|| store.subscribe("base_colour"));
    if store.is_dirty(id) {
        let colour = store.track(id, |snap| snap.base_colour().to_string());
        if let Err(error) = damper.retarget(&colour) {
            warn!("Ignoring base colour {:?}: {}", colour, error);
        }
    }

    let Some((_, material)) = garment_assets.resolved() else {
        return;
    };
    // Read first so a settled colour doesn't mark the material changed.
    let Some(current) = materials.get(material).map(|m| m.base_color.to_linear()) else {
        return;
    };
    if let Some(next) = damper.advance(current, time.delta_secs()) {
        if let Some(material) = materials.get_mut(material) {
            material.base_color = next.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn default_state_converges_to_the_default_colour() {
        let mut damper = BaseColourDamper::default();
        let expected: LinearRgba = Srgba::hex("#EFBD48").unwrap().into();
        assert_eq!(damper.target(), expected);

        let mut colour = LinearRgba::WHITE;
        for _ in 0..600 {
            match damper.advance(colour, FRAME) {
                Some(next) => colour = next,
                None => break,
            }
        }
        assert_eq!(colour, expected);
    }

    #[test]
    fn colour_moves_strictly_between_start_and_target() {
        let mut damper = BaseColourDamper::default();
        damper.retarget("#000000").unwrap();

        let mut colour = LinearRgba::WHITE;
        for _ in 0..5 {
            colour = damper.advance(colour, FRAME).unwrap();
            for channel in [colour.red, colour.green, colour.blue] {
                assert!(channel > 0.0 && channel < 1.0);
            }
        }
        assert_eq!(colour.alpha, 1.0);
    }

    #[test]
    fn malformed_colour_keeps_the_previous_target() {
        let mut damper = BaseColourDamper::default();
        damper.retarget("#112233").unwrap();
        let before = damper.target();

        assert!(damper.retarget("not a colour").is_err());
        assert_eq!(damper.target(), before);
    }

    #[test]
    fn zero_delta_leaves_colour_unchanged() {
        let mut damper = BaseColourDamper::default();
        let colour = LinearRgba::WHITE;
        assert_eq!(damper.advance(colour, 0.0), Some(colour));
    }
}
