pub mod assets;
pub mod core;
pub mod error;
pub mod garment;
pub mod loading;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod store;
pub mod systems;
