use glam::{Mat4, Vec3};
use rayon::prelude::*;

use crate::asset::Vertex;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| acc.including(p)))
    }

    /// Bounds of `vertices` after `matrix`, measured on the transformed
    /// vertices themselves. Large models reduce in parallel.
    pub fn from_points_par(vertices: &[Vertex], matrix: &Mat4) -> Option<Self> {
        vertices
            .par_iter()
            .map(|vertex| {
                let p = matrix.transform_point3(Vec3::from(vertex.pos));
                Self::new(p, p)
            })
            .reduce_with(|a, b| a.union(&b))
    }

    pub fn including(self, point: Vec3) -> Self {
        Self::new(self.min.min(point), self.max.max(point))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Largest extent across the three axes.
    pub fn max_extent(&self) -> f32 {
        self.size().max_element()
    }

    pub fn translated(&self, by: Vec3) -> Self {
        Self::new(self.min + by, self.max + by)
    }

    /// Uniform scale about the world origin.
    pub fn scaled(&self, factor: f32) -> Self {
        let a = self.min * factor;
        let b = self.max * factor;
        Self::new(a.min(b), a.max(b))
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Conservative bounds of this box after `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        let first = Self::new(corners[0], corners[0]);
        corners[1..].iter().fold(first, |acc, &c| acc.including(c))
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Slab test. Returns the entry distance along the ray, or the exit
    /// distance if the origin is inside.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let inv = direction.recip();
        let t0 = (self.min - origin) * inv;
        let t1 = (self.max - origin) * inv;

        let t_near = t0.min(t1).max_element();
        let t_far = t0.max(t1).min_element();

        if t_near <= t_far && t_far >= 0.0 {
            Some(if t_near >= 0.0 { t_near } else { t_far })
        } else {
            None
        }
    }

    pub fn abs_diff_eq(&self, other: &Self, eps: f32) -> bool {
        self.min.abs_diff_eq(other.min, eps) && self.max.abs_diff_eq(other.max, eps)
    }
}
