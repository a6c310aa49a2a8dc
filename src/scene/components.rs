// scene/components.rs
// Plain hecs components

use glam::Mat4;

use crate::asset::{Handle, MeshData};
use crate::renderer::Material;
use crate::scene::Transform;

/// Local transform relative to the parent (or the world for roots).
#[derive(Debug, Clone, Copy)]
pub struct TransformComponent(pub Transform);

/// World matrix, written by transform propagation.
#[derive(Debug, Clone, Copy)]
pub struct WorldMatrix(pub Mat4);

#[derive(Debug, Clone, Copy)]
pub struct MeshComponent(pub Handle<MeshData>);

#[derive(Debug, Clone, Copy)]
pub struct MaterialComponent(pub Material);

/// Hidden entities hide their whole subtree.
#[derive(Debug, Clone, Copy)]
pub struct Visible(pub bool);

impl Default for Visible {
    fn default() -> Self {
        Self(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Eligible for pointer picks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pickable;

/// Opts the entity out of view-frustum culling.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysDraw;

/// Lower values are drawn first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderOrder(pub i32);

#[derive(Debug, Clone, Copy)]
pub struct Parent(pub hecs::Entity);

#[derive(Debug, Clone, Default)]
pub struct Children(pub Vec<hecs::Entity>);
