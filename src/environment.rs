use glam::Vec3;
use wgpu::Color;

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Directional light shining from `position` towards the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Direction the light travels in.
    pub fn direction(&self) -> Vec3 {
        (-self.position).try_normalize().unwrap_or(Vec3::NEG_Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

/// Global rendering parameters applied to every frame: clear color,
/// fog and the fixed light rig.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    clear_color: Color,
    pub fog: Fog,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub point: PointLight,
}

impl Environment {
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Fog blend factor for a fragment `distance` units from the camera.
    pub fn fog_factor(&self, distance: f32) -> f32 {
        let span = (self.fog.far - self.fog.near).max(f32::EPSILON);
        ((distance - self.fog.near) / span).clamp(0.0, 1.0)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            fog: Fog {
                color: Vec3::ZERO,
                near: 6.0,
                far: 80.0,
            },
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.6,
            },
            directional: DirectionalLight {
                color: Vec3::ONE,
                intensity: 2.0,
                position: Vec3::new(5.0, 10.0, 5.0),
            },
            point: PointLight {
                color: Vec3::ONE,
                intensity: 1.0,
                position: Vec3::new(2.0, 5.0, 3.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_is_clear_before_near_and_opaque_after_far() {
        let env = Environment::default();
        assert_eq!(env.fog_factor(1.0), 0.0);
        assert_eq!(env.fog_factor(200.0), 1.0);
        let mid = env.fog_factor(43.0);
        assert!((mid - 0.5).abs() < 1e-6);
    }

    #[test]
    fn directional_light_points_at_origin() {
        let env = Environment::default();
        let dir = env.directional.direction();
        assert!(dir.y < 0.0);
        assert!((dir.length() - 1.0).abs() < 1e-6);
    }
}
