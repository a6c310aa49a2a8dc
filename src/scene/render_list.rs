use glam::{Mat4, Vec3, Vec4};
use hecs::Entity;

use super::bounds::Aabb;
use super::components::*;
use super::registry::SceneRegistry;
use super::Camera;
use crate::asset::{Assets, Handle, MeshData};
use crate::renderer::Material;

/// One mesh to draw this frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub entity: Entity,
    pub mesh: Handle<MeshData>,
    pub material: Material,
    pub model: Mat4,
    pub order: i32,
}

/// Six clip planes as (normal, d), normals pointing inwards.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Planes of a view-projection matrix with a [0, 1] depth range.
    pub fn from_view_proj(m: &Mat4) -> Self {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(|p| {
            let len = p.truncate().length();
            if len > 0.0 { p / len } else { p }
        });
        Self { planes }
    }

    pub fn intersects(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let n = plane.truncate();
            // Corner furthest along the plane normal.
            let p = Vec3::select(n.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            n.dot(p) + plane.w >= 0.0
        })
    }
}

/// Visible meshes in draw order. World matrices come from the last
/// [`SceneRegistry::propagate_transforms`].
pub fn collect_draws(registry: &SceneRegistry, assets: &Assets, camera: &Camera) -> Vec<DrawItem> {
    let frustum = Frustum::from_view_proj(&camera.view_proj());
    let mut items: Vec<DrawItem> = Vec::new();

    let world = registry.world();
    let mut query = world.query::<(
        &MeshComponent,
        &WorldMatrix,
        Option<&MaterialComponent>,
        Option<&RenderOrder>,
        Option<&AlwaysDraw>,
    )>();
    for (entity, (mesh, model, material, order, always)) in query.iter() {
        if !registry.is_visible(entity) {
            continue;
        }
        if always.is_none() {
            let culled = assets
                .meshes
                .get(mesh.0)
                .and_then(|m| m.bounds())
                .map(|b| !frustum.intersects(&b.transformed(&model.0)))
                .unwrap_or(false);
            if culled {
                continue;
            }
        }
        items.push(DrawItem {
            entity,
            mesh: mesh.0,
            material: material.map(|m| m.0).unwrap_or_default(),
            model: model.0,
            order: order.map(|o| o.0).unwrap_or(0),
        });
    }

    items.sort_by_key(|item| item.order);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::geometry;
    use crate::scene::{EntityBuilder, Transform};

    fn setup() -> (SceneRegistry, Assets, Handle<MeshData>) {
        let mut assets = Assets::new();
        let (v, i) = geometry::plane(1.0, 1.0);
        let mesh = assets.meshes.insert(MeshData::new("quad", v, i));
        (SceneRegistry::new(), assets, mesh)
    }

    #[test]
    fn frustum_keeps_target_and_drops_behind_camera() {
        let camera = Camera::default();
        let frustum = Frustum::from_view_proj(&camera.view_proj());
        let at_target = Aabb::new(camera.target - Vec3::splat(0.1), camera.target + Vec3::splat(0.1));
        assert!(frustum.intersects(&at_target));

        let behind = camera.eye + (camera.eye - camera.target).normalize() * 5.0;
        let behind_box = Aabb::new(behind - Vec3::splat(0.1), behind + Vec3::splat(0.1));
        assert!(!frustum.intersects(&behind_box));
    }

    #[test]
    fn hidden_and_culled_items_are_skipped() {
        let (mut registry, assets, mesh) = setup();
        let camera = Camera::default();
        EntityBuilder::new()
            .with_mesh(mesh)
            .with_transform(Transform::from_translation(camera.target))
            .spawn(&mut registry);
        EntityBuilder::new()
            .with_mesh(mesh)
            .with_transform(Transform::from_translation(camera.target))
            .visible(false)
            .spawn(&mut registry);
        EntityBuilder::new()
            .with_mesh(mesh)
            .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 50.0)))
            .spawn(&mut registry);
        EntityBuilder::new()
            .with_mesh(mesh)
            .with_transform(Transform::from_translation(Vec3::new(0.0, 0.0, 50.0)))
            .always_draw()
            .spawn(&mut registry);
        registry.propagate_transforms();

        let draws = collect_draws(&registry, &assets, &camera);
        assert_eq!(draws.len(), 2);
    }

    #[test]
    fn draws_are_sorted_by_render_order() {
        let (mut registry, assets, mesh) = setup();
        let camera = Camera::default();
        let late = EntityBuilder::new().with_mesh(mesh).always_draw().render_order(2).spawn(&mut registry);
        let early = EntityBuilder::new().with_mesh(mesh).always_draw().render_order(-1).spawn(&mut registry);
        registry.propagate_transforms();

        let draws = collect_draws(&registry, &assets, &camera);
        assert_eq!(draws.first().map(|d| d.entity), Some(early));
        assert_eq!(draws.last().map(|d| d.entity), Some(late));
    }
}
