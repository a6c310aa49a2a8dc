use glam::Mat4;
use hecs::{Entity, World};

use super::bounds::Aabb;
use super::components::*;
use super::Transform;
use crate::asset::{Assets, Handle, MeshData};

/// A pickable entity as seen by the interaction resolver.
#[derive(Debug, Clone)]
pub struct PickTarget {
    pub entity: Entity,
    pub name: Option<String>,
    pub mesh: Handle<MeshData>,
    pub world: Mat4,
}

/// Owns every placed object. All mutation goes through here, on the main
/// thread; the pickable set is a query over this world rather than a
/// separate list, so it can never name a removed entity.
pub struct SceneRegistry {
    world: World,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self {
            world: World::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn len(&self) -> u32 {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Link `child` under `parent`. The child's transform becomes relative
    /// to the parent.
    pub fn attach(&mut self, parent: Entity, child: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.world.contains(parent) || !self.world.contains(child) {
            return Err(hecs::NoSuchEntity);
        }
        self.detach(child);
        self.world.insert_one(child, Parent(parent))?;

        let has_children = self.world.get::<&Children>(parent).is_ok();
        if has_children {
            if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
                children.0.push(child);
            }
        } else {
            self.world.insert_one(parent, Children(vec![child]))?;
        }
        Ok(())
    }

    fn detach(&mut self, child: Entity) {
        let Ok(Parent(parent)) = self.world.get::<&Parent>(child).map(|p| *p) else {
            return;
        };
        if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
            children.0.retain(|&c| c != child);
        }
        let _ = self.world.remove_one::<Parent>(child);
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|p| p.0)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(entity)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    /// Visit `root` and its descendants depth-first, parents before children.
    pub fn traverse(&self, root: Entity, mut visit: impl FnMut(Entity)) {
        let mut stack = vec![root];
        while let Some(entity) = stack.pop() {
            if !self.world.contains(entity) {
                continue;
            }
            visit(entity);
            if let Ok(children) = self.world.get::<&Children>(entity) {
                stack.extend(children.0.iter().rev().copied());
            }
        }
    }

    /// Despawn `entity` and everything below it.
    pub fn remove(&mut self, entity: Entity) -> bool {
        if !self.world.contains(entity) {
            return false;
        }
        self.detach(entity);

        let mut doomed = Vec::new();
        self.traverse(entity, |e| doomed.push(e));
        for e in doomed {
            let _ = self.world.despawn(e);
        }
        true
    }

    pub fn find_by_name(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.0 == name)
            .map(|(entity, _)| entity)
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&Name>(entity).ok().map(|n| n.0.clone())
    }

    pub fn local_transform(&self, entity: Entity) -> Option<Transform> {
        self.world
            .get::<&TransformComponent>(entity)
            .ok()
            .map(|t| t.0)
    }

    /// Mutate an entity's local transform in place.
    pub fn update_transform(
        &mut self,
        entity: Entity,
        update: impl FnOnce(&mut Transform),
    ) -> bool {
        match self.world.get::<&mut TransformComponent>(entity) {
            Ok(mut t) => {
                update(&mut t.0);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_visible(&mut self, entity: Entity, visible: bool) {
        if let Ok(mut v) = self.world.get::<&mut Visible>(entity) {
            v.0 = visible;
            return;
        }
        let _ = self.world.insert_one(entity, Visible(visible));
    }

    /// Visible only if it and every ancestor are visible.
    pub fn is_visible(&self, entity: Entity) -> bool {
        let mut current = Some(entity);
        while let Some(e) = current {
            if let Ok(v) = self.world.get::<&Visible>(e) {
                if !v.0 {
                    return false;
                }
            }
            current = self.parent(e);
        }
        true
    }

    /// World matrix computed from the parent chain, independent of the
    /// last propagation.
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        if !self.world.contains(entity) {
            return None;
        }
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(entity);
        while let Some(e) = current {
            if let Some(local) = self.local_transform(e) {
                matrix = local.matrix() * matrix;
            }
            current = self.parent(e);
        }
        Some(matrix)
    }

    /// Bounds of every mesh under `root`, measured on transformed vertices.
    pub fn subtree_bounds(&self, root: Entity, assets: &Assets) -> Option<Aabb> {
        let base = self
            .parent(root)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY);

        let mut bounds: Option<Aabb> = None;
        let mut stack = vec![(root, base)];
        while let Some((entity, parent_world)) = stack.pop() {
            let local = self
                .local_transform(entity)
                .map(|t| t.matrix())
                .unwrap_or(Mat4::IDENTITY);
            let world = parent_world * local;

            if let Ok(mesh) = self.world.get::<&MeshComponent>(entity) {
                let mesh_bounds = assets
                    .meshes
                    .get(mesh.0)
                    .and_then(|m| m.transformed_bounds(&world));
                if let Some(b) = mesh_bounds {
                    bounds = Some(bounds.map_or(b, |acc| acc.union(&b)));
                }
            }

            for child in self.children(entity) {
                stack.push((child, world));
            }
        }
        bounds
    }

    /// Recompute every entity's [`WorldMatrix`] from the hierarchy.
    pub fn propagate_transforms(&mut self) {
        let roots: Vec<Entity> = self
            .world
            .query::<&TransformComponent>()
            .without::<&Parent>()
            .iter()
            .map(|(entity, _)| entity)
            .collect();

        let mut stack: Vec<(Entity, Mat4)> = roots.into_iter().map(|r| (r, Mat4::IDENTITY)).collect();
        while let Some((entity, parent_world)) = stack.pop() {
            let Some(local) = self.local_transform(entity) else {
                log::trace!("Entity {:?} has no TransformComponent, skipping", entity);
                continue;
            };
            let world = parent_world * local.matrix();

            let updated = match self.world.get::<&mut WorldMatrix>(entity) {
                Ok(mut wm) => {
                    wm.0 = world;
                    true
                }
                Err(_) => false,
            };
            if !updated {
                if let Err(err) = self.world.insert_one(entity, WorldMatrix(world)) {
                    log::error!("Failed to insert WorldMatrix for {:?}: {:?}", entity, err);
                    continue;
                }
            }

            for child in self.children(entity) {
                stack.push((child, world));
            }
        }
    }

    /// Pickable meshes with their current world matrices.
    pub fn pick_targets(&self) -> Vec<PickTarget> {
        self.world
            .query::<(&Pickable, &MeshComponent, Option<&Name>)>()
            .iter()
            .filter(|(entity, _)| self.is_visible(*entity))
            .filter_map(|(entity, (_, mesh, name))| {
                Some(PickTarget {
                    entity,
                    name: name.map(|n| n.0.clone()),
                    mesh: mesh.0,
                    world: self.world_matrix(entity)?,
                })
            })
            .collect()
    }

    pub fn is_pickable(&self, entity: Entity) -> bool {
        self.world.get::<&Pickable>(entity).is_ok()
    }
}

impl Default for SceneRegistry {
    fn default() -> Self {
        Self::new()
    }
}
