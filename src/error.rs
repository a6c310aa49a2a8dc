use std::path::PathBuf;

use thiserror::Error;

/// Failure to fetch or decode an external asset (image or model).
///
/// Always recoverable: the element that needed the asset is left out of
/// the scene and everything else keeps running.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("failed to decode image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to import glTF {path:?}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("primitive {primitive} of mesh '{mesh}' has no {attribute}")]
    MissingAttribute {
        mesh: String,
        primitive: usize,
        attribute: &'static str,
    },

    #[error("model {path:?} contains no renderable geometry")]
    NoGeometry { path: PathBuf },

    #[error("load of {path:?} was cancelled")]
    Cancelled { path: PathBuf },
}

/// Failure of the center → scale → re-measure → rest → offset pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("normalization root is not part of the scene")]
    MissingRoot,

    #[error("asset has no geometry to measure")]
    EmptyAsset,

    #[error("asset bounds are degenerate (size {size})")]
    DegenerateBounds { size: glam::Vec3 },

    #[error("target size must be positive and finite, got {0}")]
    InvalidTargetSize(f32),
}

/// Renderer failures. Everything except a lost/outdated surface is fatal
/// for the session.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    CreateSurface(String),

    #[error("no suitable graphics adapter: {0}")]
    Adapter(String),

    #[error("failed to create device: {0}")]
    Device(String),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
