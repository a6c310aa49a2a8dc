// scene/mod.rs

pub mod bounds;
pub mod builder;
pub mod camera;
pub mod components;
pub mod dressing;
pub mod registry;
pub mod render_list;
pub mod transform;

pub use bounds::Aabb;
pub use builder::EntityBuilder;
pub use camera::{Camera, Ray};
pub use dressing::Dressing;
pub use registry::{PickTarget, SceneRegistry};
pub use render_list::{collect_draws, DrawItem};
pub use transform::Transform;

pub use components::{
    AlwaysDraw, Children, MaterialComponent, MeshComponent, Name, Parent, Pickable, RenderOrder,
    TransformComponent, Visible, WorldMatrix,
};
