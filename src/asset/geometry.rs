//! Procedural meshes for the static scene.
//!
//! UVs use image convention (v = 0 is the top row) so decoded images can be
//! uploaded without flipping.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use super::mesh::{v, Vertex};

pub type Geometry = (Vec<Vertex>, Vec<u32>);

/// Rectangle in the XY plane facing +Z, centered on the origin.
pub fn plane(width: f32, height: f32) -> Geometry {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let n = [0.0, 0.0, 1.0];
    let vertices = vec![
        v([-hw, hh, 0.0], n, [0.0, 0.0]),
        v([hw, hh, 0.0], n, [1.0, 0.0]),
        v([-hw, -hh, 0.0], n, [0.0, 1.0]),
        v([hw, -hh, 0.0], n, [1.0, 1.0]),
    ];
    let indices = vec![0, 2, 1, 2, 3, 1];
    (vertices, indices)
}

/// Disc in the XY plane facing +Z.
pub fn circle(radius: f32, segments: u32) -> Geometry {
    let segments = segments.max(3);
    let n = [0.0, 0.0, 1.0];

    let mut vertices = Vec::with_capacity(segments as usize + 2);
    vertices.push(v([0.0, 0.0, 0.0], n, [0.5, 0.5]));
    for s in 0..=segments {
        let theta = s as f32 / segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        vertices.push(v(
            [radius * cos, radius * sin, 0.0],
            n,
            [(cos + 1.0) * 0.5, 1.0 - (sin + 1.0) * 0.5],
        ));
    }

    let mut indices = Vec::with_capacity(segments as usize * 3);
    for i in 1..=segments {
        indices.extend_from_slice(&[i, i + 1, 0]);
    }
    (vertices, indices)
}

/// Cylinder around the Y axis, centered on the origin. Outward faces are
/// front-facing; `open_ended` drops the caps.
pub fn cylinder(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    open_ended: bool,
) -> Geometry {
    let radial = radial_segments.max(3);
    let half = height * 0.5;
    let slope = (radius_bottom - radius_top) / height.max(f32::EPSILON);

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // Torso: two rows, top then bottom.
    for row in 0..=1u32 {
        let t = row as f32;
        let radius = t * (radius_bottom - radius_top) + radius_top;
        let y = half - t * height;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin, slope, cos).normalize();
            vertices.push(v([radius * sin, y, radius * cos], normal.to_array(), [u, t]));
        }
    }
    let stride = radial + 1;
    for x in 0..radial {
        let a = x;
        let b = x + stride;
        let c = x + 1 + stride;
        let d = x + 1;
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    if !open_ended {
        cap(&mut vertices, &mut indices, radius_top, half, radial, true);
        cap(&mut vertices, &mut indices, radius_bottom, -half, radial, false);
    }

    (vertices, indices)
}

fn cap(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    radius: f32,
    y: f32,
    radial: u32,
    top: bool,
) {
    let sign = if top { 1.0 } else { -1.0 };
    let normal = [0.0, sign, 0.0];
    let center = vertices.len() as u32;
    vertices.push(v([0.0, y, 0.0], normal, [0.5, 0.5]));

    let ring_start = vertices.len() as u32;
    for x in 0..=radial {
        let theta = x as f32 / radial as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        vertices.push(v(
            [radius * sin, y, radius * cos],
            normal,
            [cos * 0.5 + 0.5, 0.5 - sin * 0.5 * sign],
        ));
    }

    for x in 0..radial {
        let i = ring_start + x;
        if top {
            indices.extend_from_slice(&[i, i + 1, center]);
        } else {
            indices.extend_from_slice(&[i + 1, i, center]);
        }
    }
}

/// Tile and rotate UVs about the texture center.
pub fn transform_uvs(vertices: &mut [Vertex], repeat: Vec2, rotation: f32) {
    let (sin, cos) = rotation.sin_cos();
    for vertex in vertices {
        let p = (Vec2::from(vertex.uv) - Vec2::splat(0.5)) * repeat;
        let rotated = Vec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
        vertex.uv = (rotated + Vec2::splat(0.5)).to_array();
    }
}

/// Mirror U so an image reads correctly from inside a cylinder.
pub fn flip_u(vertices: &mut [Vertex]) {
    for vertex in vertices {
        vertex.uv[0] = 1.0 - vertex.uv[0];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(vertices: &[Vertex], tri: &[u32]) -> Vec3 {
        let a = Vec3::from(vertices[tri[0] as usize].pos);
        let b = Vec3::from(vertices[tri[1] as usize].pos);
        let c = Vec3::from(vertices[tri[2] as usize].pos);
        (b - a).cross(c - a)
    }

    #[test]
    fn plane_faces_positive_z() {
        let (vertices, indices) = plane(1.5, 1.0);
        for tri in indices.chunks_exact(3) {
            assert!(face_normal(&vertices, tri).z > 0.0);
        }
    }

    #[test]
    fn circle_faces_positive_z_and_has_radius() {
        let (vertices, indices) = circle(50.0, 64);
        assert_eq!(indices.len(), 64 * 3);
        for tri in indices.chunks_exact(3) {
            assert!(face_normal(&vertices, tri).z > 0.0);
        }
        let max = vertices
            .iter()
            .map(|v| Vec2::new(v.pos[0], v.pos[1]).length())
            .fold(0.0, f32::max);
        assert!((max - 50.0).abs() < 1e-3);
    }

    #[test]
    fn cylinder_torso_faces_outward() {
        let (vertices, indices) = cylinder(3.0, 3.0, 0.2, 32, true);
        for tri in indices.chunks_exact(3) {
            let a = Vec3::from(vertices[tri[0] as usize].pos);
            let outward = Vec3::new(a.x, 0.0, a.z);
            assert!(face_normal(&vertices, tri).dot(outward) > 0.0);
        }
    }

    #[test]
    fn closed_cylinder_caps_face_away_from_center() {
        let (open_vertices, open_indices) = cylinder(3.0, 3.0, 0.2, 32, true);
        let (vertices, indices) = cylinder(3.0, 3.0, 0.2, 32, false);
        assert!(vertices.len() > open_vertices.len());

        for tri in indices[open_indices.len()..].chunks_exact(3) {
            let y = vertices[tri[2] as usize].pos[1];
            assert!(face_normal(&vertices, tri).y * y > 0.0);
        }
    }

    #[test]
    fn uv_transform_tiles_about_center() {
        let (mut vertices, _) = plane(1.0, 1.0);
        transform_uvs(&mut vertices, Vec2::splat(4.0), 0.0);
        assert_eq!(vertices[0].uv, [-1.5, -1.5]);
        assert_eq!(vertices[3].uv, [2.5, 2.5]);
    }

    #[test]
    fn flip_u_mirrors() {
        let (mut vertices, _) = plane(1.0, 1.0);
        flip_u(&mut vertices);
        assert_eq!(vertices[0].uv[0], 1.0);
        assert_eq!(vertices[1].uv[0], 0.0);
    }
}
