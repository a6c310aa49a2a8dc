use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::scene::bounds::Aabb;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[inline]
pub fn v(pos: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex { pos, normal, uv }
}

/// Indexed triangle list in the mesh's local space.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub label: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: Option<Aabb>,
}

impl MeshData {
    pub fn new(label: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.pos)));
        Self {
            label: label.into(),
            vertices,
            indices,
            bounds,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Local-space bounds; `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Exact bounds of the vertices after `matrix`, not the transformed
    /// local box.
    pub fn transformed_bounds(&self, matrix: &Mat4) -> Option<Aabb> {
        Aabb::from_points_par(&self.vertices, matrix)
    }

    /// Triangles in local space, skipping any whose indices are out of range.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([Vec3::from(a.pos), Vec3::from(b.pos), Vec3::from(c.pos)])
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData::new(
            "tri",
            vec![
                v([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                v([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                v([0.0, 2.0, 0.0], [0.0, 0.0, 1.0], [0.5, 1.0]),
            ],
            vec![0, 1, 2, 0, 1, 7],
        )
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let bounds = triangle().bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn out_of_range_triangles_are_skipped() {
        let mesh = triangle();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn transformed_bounds_follow_matrix() {
        let m = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)) * Mat4::from_scale(Vec3::splat(2.0));
        let bounds = triangle().transformed_bounds(&m).unwrap();
        assert!(bounds.min.abs_diff_eq(Vec3::new(-2.0, 1.0, 0.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(2.0, 5.0, 0.0), 1e-6));
    }

    #[test]
    fn empty_mesh_has_no_bounds() {
        let mesh = MeshData::new("empty", Vec::new(), Vec::new());
        assert!(mesh.bounds().is_none());
    }
}
