/// Baked garment mesh, preloaded before the garment is spawned.
pub const GARMENT_MESH_PATH: &str = "shirt_baked.glb";

/// Node inside the garment glTF that carries the shirt geometry.
pub const GARMENT_MESH_NODE: &str = "T_Shirt_male";

/// Material inside the garment glTF whose base colour is animated.
pub const GARMENT_MATERIAL: &str = "lambert1";

/// Image both decals point at until the frontend picks something else.
pub const DEFAULT_DECAL_IMAGE: &str = "threejs.png";

/// Prefiltered "city" environment maps.
pub const CITY_DIFFUSE_MAP: &str = "environment_maps/city_diffuse_rgb9e5_zstd.ktx2";
pub const CITY_SPECULAR_MAP: &str = "environment_maps/city_specular_rgb9e5_zstd.ktx2";

/// File name used when the frontend requests a snapshot without naming one.
pub const DEFAULT_SNAPSHOT_FILE: &str = "shirt.png";
