use bevy::image::{ImageAddressMode, ImageFilterMode, ImageSampler, ImageSamplerDescriptor};
use bevy::math::Affine2;
use bevy::prelude::*;
use constants::customizer::FULL_DECAL_ANISOTROPY;

use crate::engine::store::customization_state::DecalKind;

/// Post-load configuration applied to a decal texture before it may be shown.
#[derive(Debug, Clone, Copy)]
pub struct DecalTextureSettings {
    /// Flip V when sampling. Decals follow the garment's UV convention, so this
    /// stays off to keep images from being mirrored.
    pub flip_y: bool,
    pub repeat: Vec2,
    /// Addressing forced onto the image. `None` keeps the sampler it loaded with,
    /// so a texture shared between both decals is not fought over.
    pub address_mode: Option<ImageAddressMode>,
    pub anisotropy: u16,
}

impl DecalTextureSettings {
    pub fn for_kind(kind: DecalKind) -> Self {
        match kind {
            DecalKind::Logo => Self {
                flip_y: false,
                repeat: Vec2::ONE,
                address_mode: None,
                anisotropy: 1,
            },
            // Cover the whole projected region 1:1 and wrap at the seams.
            DecalKind::Full => Self {
                flip_y: false,
                repeat: Vec2::ONE,
                address_mode: Some(ImageAddressMode::Repeat),
                anisotropy: FULL_DECAL_ANISOTROPY,
            },
        }
    }

    /// UV transform the decal material samples its texture with.
    pub fn uv_transform(&self) -> Affine2 {
        if self.flip_y {
            Affine2::from_scale_angle_translation(
                Vec2::new(self.repeat.x, -self.repeat.y),
                0.0,
                Vec2::new(0.0, self.repeat.y),
            )
        } else {
            Affine2::from_scale(self.repeat)
        }
    }

    /// Sampler to install on the image, or `None` to leave it untouched.
    pub fn sampler(&self) -> Option<ImageSampler> {
        let address_mode = self.address_mode?;
        let mut descriptor = ImageSamplerDescriptor {
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            ..ImageSamplerDescriptor::linear()
        };
        // wgpu only accepts anisotropy with linear filtering on every stage.
        if self.anisotropy > 1 {
            descriptor.mipmap_filter = ImageFilterMode::Linear;
            descriptor.anisotropy_clamp = self.anisotropy;
        }
        Some(ImageSampler::Descriptor(descriptor))
    }
}

/// Apply the decal settings for `kind` to a freshly loaded image.
pub fn configure_decal_texture(images: &mut Assets<Image>, handle: &Handle<Image>, kind: DecalKind) -> bool {
    let Some(sampler) = DecalTextureSettings::for_kind(kind).sampler() else {
        return images.contains(handle);
    };
    let Some(image) = images.get_mut(handle) else {
        return false;
    };
    image.sampler = sampler;
    true
}
