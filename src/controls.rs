use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::scene::Camera;
use crate::settings::CameraSettings;

const MIN_POLAR: f32 = 1e-3;
const MAX_POLAR: f32 = PI - 1e-3;
const ZOOM_STEP: f32 = 0.95;
/// Deltas smaller than this count as settled.
const REST_EPSILON: f32 = 1e-5;

/// Position relative to the orbit target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle measured from +Y.
    phi: f32,
    /// Azimuth around +Y, zero along +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Damped orbit around a target point. Input accumulates pending motion;
/// each [`update`](Self::update) applies a `damping` share of it and keeps
/// the rest for later frames, so motion eases out instead of stopping dead.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pending_theta: f32,
    pending_phi: f32,
    pending_pan: Vec3,
    scale: f32,
}

impl OrbitControls {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        Self {
            target: Vec3::from(settings.target),
            damping: settings.damping,
            rotate_speed: settings.rotate_speed,
            zoom_speed: settings.zoom_speed,
            pan_speed: settings.pan_speed,
            min_distance: 0.5,
            max_distance: 18.0,
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_pan: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.pending_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.pending_phi -= angle;
    }

    /// Drag of `delta` pixels in a viewport `viewport_height` pixels tall.
    /// A drag the full height turns one full circle.
    pub fn rotate_by_drag(&mut self, delta: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.rotate_left(TAU * delta.x / height * self.rotate_speed);
        self.rotate_up(TAU * delta.y / height * self.rotate_speed);
    }

    /// Positive `steps` move closer (wheel up).
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= ZOOM_STEP.powf(steps * self.zoom_speed);
    }

    /// Move the target with the screen: the point under the pointer
    /// follows the drag at target depth.
    pub fn pan_by_drag(&mut self, delta: Vec2, viewport_height: f32, camera: &Camera) {
        let offset = camera.eye - self.target;
        let target_distance = offset.length() * (camera.fov_y_radians * 0.5).tan();
        let per_pixel = 2.0 * target_distance / viewport_height.max(1.0) * self.pan_speed;

        let forward = (-offset).normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();
        let up = right.cross(forward);
        self.pending_pan += (-right * delta.x + up * delta.y) * per_pixel;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_theta.abs() < REST_EPSILON
            && self.pending_phi.abs() < REST_EPSILON
            && self.pending_pan.length() < REST_EPSILON
            && (self.scale - 1.0).abs() < REST_EPSILON
    }

    /// Advance one frame and write the result to `camera`.
    pub fn update(&mut self, camera: &mut Camera) {
        let mut spherical = Spherical::from_offset(camera.eye - self.target);

        spherical.theta += self.pending_theta * self.damping;
        spherical.phi = (spherical.phi + self.pending_phi * self.damping).clamp(MIN_POLAR, MAX_POLAR);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pending_pan * self.damping;
        camera.target = self.target;
        camera.eye = self.target + spherical.to_offset();

        let keep = 1.0 - self.damping;
        self.pending_theta *= keep;
        self.pending_phi *= keep;
        self.pending_pan *= keep;
        self.scale = 1.0;
    }
}
