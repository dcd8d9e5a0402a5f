//! Scene store for the glint renderer.
//!
//! Holds the committed, read-only scene data: flat geometry arrays,
//! materials with texture indices, lights, and the per-axis triangle extent
//! tables consumed by the kd-tree builder.

mod material;
mod mesh;
mod scene;
mod texture;
mod triangle;

pub use material::{BrdfId, Color, Light, Material, MaterialId, Radiance, TextureId};
pub use mesh::MeshData;
pub use scene::{Scene, SceneBuilder, SceneError};
pub use texture::{Texture, TextureCache, TextureError};
pub use triangle::{Intersection, Triangle};
