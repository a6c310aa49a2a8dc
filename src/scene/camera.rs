use glam::{Mat4, Vec2, Vec3};

use crate::settings::CameraSettings;

/// Ray in world space. `direction` is unit length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Perspective camera. Depth maps to [0, 1] as wgpu expects.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        Self {
            eye: Vec3::from(settings.position),
            target: Vec3::from(settings.target),
            up: Vec3::Y,
            fov_y_radians: settings.fov_y_degrees.to_radians(),
            aspect,
            near: settings.near,
            far: settings.far,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj() * self.view()
    }

    pub fn position(&self) -> Vec3 {
        self.eye
    }

    /// Ray from the eye through a point in normalized device coordinates.
    pub fn ray_through(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_proj().inverse();
        let far = inverse.project_point3(ndc.extend(1.0));
        Ray::new(self.eye, far - self.eye)
    }

    /// World point to normalized device coordinates (x, y in [-1, 1] when
    /// on screen, z in [0, 1] between the clip planes).
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.view_proj().project_point3(world)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default(), 16.0 / 9.0)
    }
}
