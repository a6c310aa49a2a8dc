use bitflags::bitflags;
use glam::Vec4;

use crate::asset::{Handle, ImageData};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        /// Render both faces; the back face is lit with the flipped normal.
        const DOUBLE_SIDED = 1 << 0;
        /// Skip lighting, output the base color as is.
        const UNLIT = 1 << 1;
        /// Test against depth but never write it.
        const NO_DEPTH_WRITE = 1 << 2;
        const NO_FOG = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: Vec4,
    pub texture: Option<Handle<ImageData>>,
    pub flags: MaterialFlags,
}

impl Material {
    /// Lit material with the given sRGB hex color, e.g. `0x444444`.
    pub fn from_hex(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self {
            base_color: Vec4::new(channel(16), channel(8), channel(0), 1.0),
            texture: None,
            flags: MaterialFlags::empty(),
        }
    }

    pub fn white() -> Self {
        Self::from_hex(0xffffff)
    }

    pub fn textured(texture: Handle<ImageData>) -> Self {
        Self {
            texture: Some(texture),
            ..Self::white()
        }
    }

    pub fn with_base_color(mut self, color: Vec4) -> Self {
        self.base_color = color;
        self
    }

    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn double_sided(self) -> Self {
        self.with_flags(MaterialFlags::DOUBLE_SIDED)
    }

    pub fn unlit(self) -> Self {
        self.with_flags(MaterialFlags::UNLIT)
    }

    pub fn is_double_sided(&self) -> bool {
        self.flags.contains(MaterialFlags::DOUBLE_SIDED)
    }

    pub fn writes_depth(&self) -> bool {
        !self.flags.contains(MaterialFlags::NO_DEPTH_WRITE)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_decode_per_channel() {
        let m = Material::from_hex(0x151523);
        assert!((m.base_color.x - 0x15 as f32 / 255.0).abs() < 1e-6);
        assert!((m.base_color.z - 0x23 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(m.base_color.w, 1.0);
    }

    #[test]
    fn builder_flags_accumulate() {
        let m = Material::white().double_sided().unlit();
        assert!(m.is_double_sided());
        assert!(m.flags.contains(MaterialFlags::UNLIT));
        assert!(m.writes_depth());
    }
}
