use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wrap {
    #[default]
    Repeat,
    ClampToEdge,
    MirrorRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

/// How the renderer samples an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplerOptions {
    pub wrap_u: Wrap,
    pub wrap_v: Wrap,
    pub mag_filter: Filter,
    pub min_filter: Filter,
}

impl SamplerOptions {
    pub fn repeat() -> Self {
        Self::default()
    }

    /// Wraps horizontally, clamps vertically. Used for panoramic backdrops.
    pub fn panorama() -> Self {
        Self {
            wrap_v: Wrap::ClampToEdge,
            ..Self::default()
        }
    }

    pub fn clamp() -> Self {
        Self {
            wrap_u: Wrap::ClampToEdge,
            wrap_v: Wrap::ClampToEdge,
            ..Self::default()
        }
    }
}

/// Decoded RGBA8 image, ready for upload.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub sampler: SamplerOptions,
    pub srgb: bool,
}

impl ImageData {
    pub fn from_rgba8(
        label: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        sampler: SamplerOptions,
    ) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            label: label.into(),
            width,
            height,
            pixels,
            sampler,
            srgb: true,
        }
    }

    pub fn solid(label: impl Into<String>, color: [u8; 4]) -> Self {
        Self::from_rgba8(label, 1, 1, color.to_vec(), SamplerOptions::clamp())
    }

    pub fn decode(
        label: impl Into<String>,
        bytes: &[u8],
        sampler: SamplerOptions,
        path: &Path,
    ) -> Result<Self, AssetError> {
        let decoded = ::image::load_from_memory(bytes).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self::from_rgba8(label, width, height, rgba.into_raw(), sampler))
    }

    /// Read and decode an image file.
    pub fn load(path: &Path, sampler: SamplerOptions) -> Result<Self, AssetError> {
        log::info!("Loading image: {:?}", path);
        let bytes = crate::io::load_binary(path)?;
        Self::decode(path.to_string_lossy(), &bytes, sampler, path)
    }

    /// Convert an image embedded in a glTF document, expanding to RGBA8.
    /// Returns `None` for pixel formats without an 8-bit mapping.
    pub fn from_gltf(label: impl Into<String>, data: gltf::image::Data) -> Option<Self> {
        use gltf::image::Format;

        let pixel_count = (data.width * data.height) as usize;
        let pixels = match data.format {
            Format::R8G8B8A8 => data.pixels,
            Format::R8G8B8 => data
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            Format::R8G8 => data
                .pixels
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
            other => {
                log::warn!("Unsupported embedded image format {:?}", other);
                return None;
            }
        };

        if pixels.len() != pixel_count * 4 {
            log::warn!("Embedded image has {} bytes, expected {}", pixels.len(), pixel_count * 4);
            return None;
        }

        Some(Self::from_rgba8(
            label,
            data.width,
            data.height,
            pixels,
            SamplerOptions::repeat(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_gltf_image_expands_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![10, 20, 30, 40, 50, 60],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let image = ImageData::from_gltf("rgb", data).unwrap();
        assert_eq!(image.pixels, vec![10, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn invalid_bytes_are_a_decode_error() {
        let err = ImageData::decode("bad", b"not an image", SamplerOptions::repeat(), Path::new("bad.png"))
            .unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }

    #[test]
    fn missing_image_is_an_io_error() {
        let err = ImageData::load(Path::new("missing/photo.png"), SamplerOptions::repeat()).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn panorama_wraps_horizontally_only() {
        let sampler = SamplerOptions::panorama();
        assert_eq!(sampler.wrap_u, Wrap::Repeat);
        assert_eq!(sampler.wrap_v, Wrap::ClampToEdge);
    }
}
