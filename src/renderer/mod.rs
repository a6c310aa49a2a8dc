pub mod gpu;
pub mod material;
pub mod pipelines;
pub mod texture;
pub mod uniforms;

pub use gpu::Renderer;
pub use material::{Material, MaterialFlags};
