use bevy::asset::RenderAssetUsages;
use bevy::math::EulerRot;
use bevy::prelude::*;
use bevy::render::mesh::{PrimitiveTopology, VertexAttributeValues};

use crate::engine::error::SceneError;

/// Oriented box a decal is projected through, in garment mesh space.
/// Projection runs along the box's local Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalProjector {
    pub translation: Vec3,
    pub rotation: Quat,
    pub size: Vec3,
}

impl DecalProjector {
    pub fn new(translation: Vec3, euler: Vec3, size: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
            size,
        }
    }

    fn to_projector_space(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.translation)
    }

    fn to_mesh_space(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }
}

#[derive(Debug, Clone, Copy)]
struct DecalVertex {
    position: Vec3,
    normal: Vec3,
}

impl DecalVertex {
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
        }
    }
}

/// Build decal geometry for `projector` from the garment surface.
///
/// Returns `Ok(None)` when no part of the surface falls inside the box.
pub fn project_decal(garment: &Mesh, projector: &DecalProjector) -> Result<Option<Mesh>, SceneError> {
    let positions = float3_attribute(garment, Mesh::ATTRIBUTE_POSITION, "POSITION")?;
    let normals = float3_attribute(garment, Mesh::ATTRIBUTE_NORMAL, "NORMAL")?;

    let triangle_indices: Vec<usize> = match garment.indices() {
        Some(indices) => indices.iter().collect(),
        None => (0..positions.len()).collect(),
    };

    let half = projector.size * 0.5;
    let planes = [
        (Vec3::X, half.x),
        (Vec3::NEG_X, half.x),
        (Vec3::Y, half.y),
        (Vec3::NEG_Y, half.y),
        (Vec3::Z, half.z),
        (Vec3::NEG_Z, half.z),
    ];

    let mut clipped: Vec<DecalVertex> = Vec::new();
    for triangle in triangle_indices.chunks_exact(3) {
        let mut polygon: Vec<DecalVertex> = Vec::with_capacity(9);
        for &index in triangle {
            let (Some(position), Some(normal)) = (positions.get(index), normals.get(index)) else {
                continue;
            };
            polygon.push(DecalVertex {
                position: projector.to_projector_space(Vec3::from(*position)),
                normal: projector.rotation.inverse() * Vec3::from(*normal),
            });
        }

        for (normal, distance) in planes {
            if polygon.len() < 3 {
                break;
            }
            polygon = clip_polygon(&polygon, normal, distance);
        }

        // Fan triangulation of the convex clipped polygon.
        for i in 1..polygon.len().saturating_sub(1) {
            clipped.extend([polygon[0], polygon[i], polygon[i + 1]]);
        }
    }

    if clipped.is_empty() {
        return Ok(None);
    }

    let mut out_positions = Vec::with_capacity(clipped.len());
    let mut out_normals = Vec::with_capacity(clipped.len());
    let mut out_uvs = Vec::with_capacity(clipped.len());
    for vertex in &clipped {
        // Image top maps to +Y of the projector.
        out_uvs.push([
            0.5 + vertex.position.x / projector.size.x,
            0.5 - vertex.position.y / projector.size.y,
        ]);
        out_positions.push(projector.to_mesh_space(vertex.position).to_array());
        out_normals.push(
            (projector.rotation * vertex.normal)
                .normalize_or(Vec3::Z)
                .to_array(),
        );
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, out_positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, out_normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, out_uvs);
    Ok(Some(mesh))
}

fn float3_attribute<'a>(
    mesh: &'a Mesh,
    attribute: bevy::render::mesh::MeshVertexAttribute,
    name: &'static str,
) -> Result<&'a [[f32; 3]], SceneError> {
    match mesh.attribute(attribute) {
        Some(VertexAttributeValues::Float32x3(values)) => Ok(values.as_slice()),
        _ => Err(SceneError::MissingVertexAttribute { attribute: name }),
    }
}

// Sutherland-Hodgman against the half-space `dot(normal, p) <= distance`.
fn clip_polygon(polygon: &[DecalVertex], normal: Vec3, distance: f32) -> Vec<DecalVertex> {
    let mut output = Vec::with_capacity(polygon.len() + 1);
    for (i, &current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let current_side = current.position.dot(normal) - distance;
        let next_side = next.position.dot(normal) - distance;

        if current_side <= 0.0 {
            output.push(current);
        }
        if (current_side <= 0.0) != (next_side <= 0.0) {
            let t = current_side / (current_side - next_side);
            output.push(current.lerp(next, t));
        }
    }
    output
}
