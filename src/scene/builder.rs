// scene/builder.rs
// Fluent helper for spawning entities into a SceneRegistry

use hecs::Entity;

use super::components::*;
use super::registry::SceneRegistry;
use crate::asset::{Handle, MeshData};
use crate::renderer::Material;
use crate::scene::Transform;

/// Collects components, then spawns them and links the parent.
///
/// Every spawned entity gets a [`TransformComponent`] and [`Visible`] even
/// if none was given.
pub struct EntityBuilder {
    builder: hecs::EntityBuilder,
    parent: Option<Entity>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self {
            builder: hecs::EntityBuilder::new(),
            parent: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.builder.add(Name::new(name));
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.builder.add(TransformComponent(transform));
        self
    }

    pub fn with_mesh(mut self, mesh: Handle<MeshData>) -> Self {
        self.builder.add(MeshComponent(mesh));
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.builder.add(MaterialComponent(material));
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.builder.add(Visible(visible));
        self
    }

    /// Make the entity a candidate for pointer picks.
    pub fn pickable(mut self) -> Self {
        self.builder.add(Pickable);
        self
    }

    pub fn always_draw(mut self) -> Self {
        self.builder.add(AlwaysDraw);
        self
    }

    pub fn render_order(mut self, order: i32) -> Self {
        self.builder.add(RenderOrder(order));
        self
    }

    pub fn child_of(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn spawn(mut self, registry: &mut SceneRegistry) -> Entity {
        if !self.builder.has::<TransformComponent>() {
            self.builder.add(TransformComponent(Transform::IDENTITY));
        }
        if !self.builder.has::<Visible>() {
            self.builder.add(Visible::default());
        }

        let entity = registry.world_mut().spawn(self.builder.build());
        if let Some(parent) = self.parent {
            if registry.attach(parent, entity).is_err() {
                log::warn!("Parent {:?} is gone, {:?} spawned as a root", parent, entity);
            }
        }
        entity
    }
}

impl Default for EntityBuilder {
    fn default() -> Self {
        Self::new()
    }
}
