//! Pointer clicks to scene picks and overlay state.

use glam::{Vec2, Vec3};
use hecs::Entity;

use crate::asset::Assets;
use crate::overlay::{OverlayLayout, OverlayRegion, OverlayState};
use crate::scene::{Camera, Ray, SceneRegistry};

/// Axis-aligned rectangle in physical pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open: the right and bottom edges are outside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left
            && point.y >= self.top
            && point.x < self.left + self.width
            && point.y < self.top + self.height
    }

    /// Map a point inside the rectangle to normalized device coordinates,
    /// x right and y up, both in [-1, 1]. Points outside map to `None`.
    pub fn to_ndc(&self, point: Vec2) -> Option<Vec2> {
        if self.is_empty() || !self.contains(point) {
            return None;
        }
        Some(Vec2::new(
            (point.x - self.left) / self.width * 2.0 - 1.0,
            -((point.y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }
}

/// Nearest pickable surface under a ray.
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub entity: Entity,
    pub name: Option<String>,
    pub distance: f32,
    pub point: Vec3,
}

const EPSILON: f32 = 1e-7;

/// Möller–Trumbore, both faces. Returns the ray parameter of the hit.
pub fn intersect_triangle(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Cast `ray` against the pickable entities only and keep the nearest hit.
pub fn pick(registry: &SceneRegistry, assets: &Assets, ray: &Ray) -> Option<PickHit> {
    let mut nearest: Option<PickHit> = None;

    for target in registry.pick_targets() {
        let Some(mesh) = assets.meshes.get(target.mesh) else {
            continue;
        };
        let Some(world_bounds) = mesh.bounds().map(|b| b.transformed(&target.world)) else {
            continue;
        };
        let Some(entry) = world_bounds.intersect_ray(ray.origin, ray.direction) else {
            continue;
        };
        let entry = if world_bounds.contains(ray.origin) { 0.0 } else { entry };
        if nearest.as_ref().is_some_and(|hit| entry > hit.distance) {
            continue;
        }

        let closest = mesh
            .triangles()
            .filter_map(|tri| intersect_triangle(ray, tri.map(|p| target.world.transform_point3(p))))
            .min_by(|a, b| a.total_cmp(b));

        if let Some(t) = closest {
            if nearest.as_ref().map_or(true, |hit| t < hit.distance) {
                nearest = Some(PickHit {
                    entity: target.entity,
                    name: target.name.clone(),
                    distance: t,
                    point: ray.at(t),
                });
            }
        }
    }
    nearest
}

/// What a click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// The scene is not interactive yet.
    Ignored,
    /// Landed outside the viewport or on nothing pickable.
    NoHit,
    /// Nearest hit was something other than the card.
    Hit(PickHit),
    OverlayOpened(PickHit),
    OverlayDismissed,
    /// Inside the overlay content; swallowed.
    OverlayContent,
}

/// Everything a pick reads.
#[derive(Clone, Copy)]
pub struct PickScene<'a> {
    pub registry: &'a SceneRegistry,
    pub assets: &'a Assets,
    pub camera: &'a Camera,
}

/// Routes clicks either to the overlay (while it is showing) or to a
/// scene pick. A click consumed by the overlay never reaches the scene.
#[derive(Debug, Clone)]
pub struct InteractionResolver {
    card_name: String,
    enabled: bool,
}

impl InteractionResolver {
    pub fn new(card_name: impl Into<String>) -> Self {
        Self {
            card_name: card_name.into(),
            enabled: false,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pick under `point` without touching any state.
    pub fn pick_at(&self, point: Vec2, viewport: ScreenRect, scene: PickScene<'_>) -> Option<PickHit> {
        let ndc = viewport.to_ndc(point)?;
        let ray = scene.camera.ray_through(ndc);
        pick(scene.registry, scene.assets, &ray)
    }

    pub fn handle_click(
        &self,
        point: Vec2,
        viewport: ScreenRect,
        layout: &OverlayLayout,
        scene: PickScene<'_>,
        overlay: &mut OverlayState,
    ) -> ClickOutcome {
        if !self.enabled {
            return ClickOutcome::Ignored;
        }

        if overlay.is_visible() {
            return match layout.region_at(point) {
                Some(OverlayRegion::Close) | Some(OverlayRegion::Backdrop) => {
                    overlay.dismiss();
                    ClickOutcome::OverlayDismissed
                }
                Some(OverlayRegion::Content) => ClickOutcome::OverlayContent,
                None => ClickOutcome::NoHit,
            };
        }

        let Some(hit) = self.pick_at(point, viewport, scene) else {
            log::trace!("Click at {:?} hit nothing", point);
            return ClickOutcome::NoHit;
        };
        log::debug!("Click hit {:?} ({:?}) at {:.3}", hit.name, hit.entity, hit.distance);

        if hit.name.as_deref() == Some(self.card_name.as_str()) {
            overlay.open();
            ClickOutcome::OverlayOpened(hit)
        } else {
            ClickOutcome::Hit(hit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_accounts_for_viewport_offset() {
        let rect = ScreenRect::new(100.0, 50.0, 200.0, 100.0);
        assert_eq!(rect.to_ndc(Vec2::new(100.0, 50.0)), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(rect.to_ndc(Vec2::new(200.0, 100.0)), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(rect.to_ndc(Vec2::new(50.0, 60.0)), None);
        assert_eq!(rect.to_ndc(Vec2::new(300.0, 60.0)), None);
        assert_eq!(ScreenRect::from_size(0.0, 10.0).to_ndc(Vec2::ZERO), None);
    }

    #[test]
    fn triangle_hits_from_both_sides() {
        let tri = [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let front = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!((intersect_triangle(&front, tri).unwrap() - 5.0).abs() < 1e-5);
        assert!((intersect_triangle(&back, tri).unwrap() - 5.0).abs() < 1e-5);

        let away = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);
        assert!(intersect_triangle(&away, tri).is_none());
        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(intersect_triangle(&miss, tri).is_none());
    }

    #[test]
    fn disabled_resolver_ignores_clicks() {
        let resolver = InteractionResolver::new("card");
        let registry = SceneRegistry::new();
        let assets = Assets::new();
        let camera = Camera::default();
        let viewport = ScreenRect::from_size(800.0, 600.0);
        let layout = OverlayLayout::compute(viewport, 1.5, 1.0);
        let mut overlay = OverlayState::default();
        let scene = PickScene {
            registry: &registry,
            assets: &assets,
            camera: &camera,
        };
        let outcome = resolver.handle_click(Vec2::new(400.0, 300.0), viewport, &layout, scene, &mut overlay);
        assert_eq!(outcome, ClickOutcome::Ignored);
    }
}
