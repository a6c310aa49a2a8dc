// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::environment::Environment;
use crate::interaction::ScreenRect;
use crate::renderer::Material;
use crate::scene::Camera;

/// Dynamic-offset alignment for per-object and per-quad uniforms.
pub const UNIFORM_STRIDE: u64 = 256;

fn rgb_scaled(color: Vec3, intensity: f32) -> [f32; 4] {
    (color * intensity).extend(1.0).to_array()
}

/// Camera, fog and lights: bound once per frame.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct GlobalsUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub fog_color: [f32; 4],
    /// near, far, view opacity, unused.
    pub fog_params: [f32; 4],
    pub ambient: [f32; 4],
    pub directional_color: [f32; 4],
    pub directional_dir: [f32; 4],
    pub point_color: [f32; 4],
    pub point_position: [f32; 4],
}

impl GlobalsUniform {
    pub fn new(camera: &Camera, environment: &Environment, view_opacity: f32) -> Self {
        let fog = environment.fog;
        Self {
            view_proj: camera.view_proj().to_cols_array_2d(),
            camera_pos: camera.position().extend(1.0).to_array(),
            fog_color: fog.color.extend(1.0).to_array(),
            fog_params: [fog.near, fog.far, view_opacity.clamp(0.0, 1.0), 0.0],
            ambient: rgb_scaled(environment.ambient.color, environment.ambient.intensity),
            directional_color: rgb_scaled(
                environment.directional.color,
                environment.directional.intensity,
            ),
            directional_dir: environment.directional.direction().extend(0.0).to_array(),
            point_color: rgb_scaled(environment.point.color, environment.point.intensity),
            point_position: environment.point.position.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// Material flag bits, then padding.
    pub flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, material: &Material) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            base_color: material.base_color.to_array(),
            flags: [material.flags.bits(), 0, 0, 0],
        }
    }
}

/// How an overlay quad is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum QuadFill {
    Solid = 0,
    Textured = 1,
    /// Solid disc with a cross, for the close control.
    Close = 2,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct QuadUniform {
    /// Left, top, right, bottom in NDC.
    pub rect: [f32; 4],
    pub color: [f32; 4],
    pub mode: [u32; 4],
}

impl QuadUniform {
    pub fn new(rect: ScreenRect, viewport: ScreenRect, color: [f32; 4], fill: QuadFill) -> Self {
        let to_ndc_x = |x: f32| (x - viewport.left) / viewport.width.max(1.0) * 2.0 - 1.0;
        let to_ndc_y = |y: f32| 1.0 - (y - viewport.top) / viewport.height.max(1.0) * 2.0;
        Self {
            rect: [
                to_ndc_x(rect.left),
                to_ndc_y(rect.top),
                to_ndc_x(rect.left + rect.width),
                to_ndc_y(rect.top + rect.height),
            ],
            color,
            mode: [fill as u32, 0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MaterialFlags;

    fn flags_have(bits: u32, flag: MaterialFlags) -> bool {
        MaterialFlags::from_bits_truncate(bits).contains(flag)
    }

    #[test]
    fn uniforms_fit_the_dynamic_stride() {
        assert_eq!(std::mem::size_of::<GlobalsUniform>(), 64 + 8 * 16);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
        assert!(std::mem::size_of::<ObjectUniform>() as u64 <= UNIFORM_STRIDE);
        assert!(std::mem::size_of::<QuadUniform>() as u64 <= UNIFORM_STRIDE);
    }

    #[test]
    fn quad_covers_full_viewport_in_ndc() {
        let viewport = ScreenRect::from_size(800.0, 600.0);
        let quad = QuadUniform::new(viewport, viewport, [0.0; 4], QuadFill::Solid);
        assert_eq!(quad.rect, [-1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn view_opacity_is_clamped() {
        let globals = GlobalsUniform::new(&Camera::default(), &Environment::default(), 3.0);
        assert_eq!(globals.fog_params[2], 1.0);
    }

    #[test]
    fn object_flags_round_trip_material_bits() {
        let material = Material::white().double_sided().unlit();
        let object = ObjectUniform::new(Mat4::IDENTITY, &material);
        assert!(flags_have(object.flags[0], MaterialFlags::DOUBLE_SIDED));
        assert!(flags_have(object.flags[0], MaterialFlags::UNLIT));
        assert!(!flags_have(object.flags[0], MaterialFlags::NO_FOG));
    }
}
