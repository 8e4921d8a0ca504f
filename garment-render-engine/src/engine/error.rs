use thiserror::Error;

/// Structural failures that take down the whole garment scene.
///
/// Texture failures are deliberately not represented here: a decal whose
/// image fails to load is simply omitted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("garment mesh `{path}` failed to load: {reason}")]
    MeshLoad { path: String, reason: String },

    #[error("garment mesh `{path}` has no node named `{node}`")]
    MissingMeshNode { path: String, node: String },

    #[error("garment node `{node}` carries no mesh primitives")]
    EmptyMeshNode { node: String },

    #[error("garment mesh `{path}` has no material named `{material}`")]
    MissingMaterial { path: String, material: String },

    #[error("garment geometry is missing the {attribute} vertex attribute")]
    MissingVertexAttribute { attribute: &'static str },

    #[error("garment asset handle was released before it was resolved")]
    AssetReleased,
}
