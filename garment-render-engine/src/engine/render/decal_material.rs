use bevy::math::Affine2;
use bevy::pbr::{ExtendedMaterial, MaterialExtension, MaterialExtensionKey, MaterialExtensionPipeline};
use bevy::prelude::*;
use bevy::render::mesh::MeshVertexBufferLayoutRef;
use bevy::render::render_resource::{
    AsBindGroup, CompareFunction, RenderPipelineDescriptor, SpecializedMeshPipelineError,
};
use constants::customizer::DECAL_POLYGON_OFFSET_FACTOR;

use crate::engine::store::customization_state::DecalKind;

pub type DecalMaterial = ExtendedMaterial<StandardMaterial, DecalCompositing>;

/// How a decal layer interacts with the depth buffer.
#[derive(Asset, AsBindGroup, Reflect, Debug, Clone, Copy, PartialEq)]
#[bind_group_data(DecalDepthKey)]
pub struct DecalCompositing {
    pub depth_test: bool,
    pub depth_write: bool,
    pub polygon_offset_factor: i32,
}

impl DecalCompositing {
    pub fn for_kind(kind: DecalKind) -> Self {
        match kind {
            DecalKind::Full => Self {
                depth_test: true,
                depth_write: false,
                polygon_offset_factor: DECAL_POLYGON_OFFSET_FACTOR,
            },
            // Drawn over the full decal regardless of what it left in depth.
            DecalKind::Logo => Self {
                depth_test: false,
                depth_write: true,
                polygon_offset_factor: DECAL_POLYGON_OFFSET_FACTOR,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecalDepthKey {
    depth_test: bool,
    depth_write: bool,
    polygon_offset_factor: i32,
}

impl From<&DecalCompositing> for DecalDepthKey {
    fn from(compositing: &DecalCompositing) -> Self {
        Self {
            depth_test: compositing.depth_test,
            depth_write: compositing.depth_write,
            polygon_offset_factor: compositing.polygon_offset_factor,
        }
    }
}

impl MaterialExtension for DecalCompositing {
    fn specialize(
        _pipeline: &MaterialExtensionPipeline,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayoutRef,
        key: MaterialExtensionKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let Some(depth_stencil) = descriptor.depth_stencil.as_mut() else {
            return Ok(());
        };
        let depth = key.bind_group_data;
        depth_stencil.depth_write_enabled = depth.depth_write;
        if !depth.depth_test {
            depth_stencil.depth_compare = CompareFunction::Always;
        }
        // Reversed-Z: a negative GL-style factor pulls toward the camera, which
        // here means a larger depth value.
        depth_stencil.bias.slope_scale = -(depth.polygon_offset_factor as f32);
        Ok(())
    }
}

/// Build the material for one decal layer.
///
/// `uv_transform` comes from the texture settings for the same kind.
pub fn decal_material(kind: DecalKind, texture: Handle<Image>, uv_transform: Affine2) -> DecalMaterial {
    ExtendedMaterial {
        base: StandardMaterial {
            base_color_texture: Some(texture),
            alpha_mode: AlphaMode::Blend,
            perceptual_roughness: 1.0,
            uv_transform,
            // Sort the logo after the full decal in the transparent pass.
            depth_bias: match kind {
                DecalKind::Full => 0.0,
                DecalKind::Logo => 1.0,
            },
            ..default()
        },
        extension: DecalCompositing::for_kind(kind),
    }
}

pub struct DecalMaterialPlugin;

impl Plugin for DecalMaterialPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<DecalMaterial>::default());
    }
}
