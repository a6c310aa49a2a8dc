pub mod cache;
pub mod geometry;
pub mod handle;
pub mod image_data;
pub mod loader;
pub mod mesh;
pub mod model;

pub use cache::AssetCache;
pub use handle::Handle;
pub use image_data::{Filter, ImageData, SamplerOptions, Wrap};
pub use loader::{ModelLoad, PendingLoad};
pub use mesh::{MeshData, Vertex};
pub use model::RawModel;

/// CPU-side geometry and images. The renderer mirrors these onto the GPU
/// lazily, keyed by handle.
#[derive(Default)]
pub struct Assets {
    pub meshes: AssetCache<MeshData>,
    pub images: AssetCache<ImageData>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }
}
