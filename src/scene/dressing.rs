//! Static set pieces around the model: sky, ground, table, photos and the
//! greeting card.

use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use glam::{Quat, Vec2, Vec3};
use hecs::Entity;

use super::registry::SceneRegistry;
use super::{EntityBuilder, Transform};
use crate::asset::{geometry, Assets, Handle, ImageData, MeshData, SamplerOptions};
use crate::renderer::{Material, MaterialFlags};
use crate::settings::{BackdropSettings, CardSettings, PhotoSettings};

const SKY_RADIUS: f32 = 20.0;
const SKY_HEIGHT: f32 = 20.0;
const SKY_Y: f32 = 5.0;
const SKY_CAP_RADIUS: f32 = 50.0;
const SKY_CAP_Y: f32 = 25.0;
const SKY_CAP_COLOR: u32 = 0x151523;
const GROUND_RADIUS: f32 = 50.0;
const GROUND_Y: f32 = -4.0;
const GROUND_REPEAT: f32 = 4.0;
const TABLE_RADIUS: f32 = 3.0;
const TABLE_HEIGHT: f32 = 0.2;
const TABLE_COLOR: u32 = 0x444444;
const PHOTO_SIZE: Vec2 = Vec2::new(1.6, 1.1);
const PHOTO_LOOK_AT: Vec3 = Vec3::new(0.0, 1.4, 0.0);

/// What the rest of the session needs from the dressing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dressing {
    pub card: Option<Entity>,
    pub card_texture: Option<Handle<ImageData>>,
}

fn load_texture(assets: &mut Assets, path: &Path, sampler: SamplerOptions) -> Option<Handle<ImageData>> {
    match ImageData::load(path, sampler) {
        Ok(image) => Some(assets.images.insert(image)),
        Err(err) => {
            log::error!("Skipping element, texture failed to load: {}", err);
            None
        }
    }
}

fn add_mesh(assets: &mut Assets, label: &str, (vertices, indices): geometry::Geometry) -> Handle<MeshData> {
    assets.meshes.insert(MeshData::new(label, vertices, indices))
}

/// Sky cylinder with a flat cap above it and the textured ground disc.
pub fn spawn_backdrop(registry: &mut SceneRegistry, assets: &mut Assets, settings: &BackdropSettings) {
    if let Some(texture) = load_texture(assets, &settings.sky_texture, SamplerOptions::panorama()) {
        let mut sky = geometry::cylinder(SKY_RADIUS, SKY_RADIUS, SKY_HEIGHT, 128, true);
        // Seen from inside, so mirror the panorama back to reading order.
        geometry::flip_u(&mut sky.0);
        let mesh = add_mesh(assets, "sky", sky);
        EntityBuilder::new()
            .with_name("sky")
            .with_mesh(mesh)
            .with_material(
                Material::textured(texture)
                    .unlit()
                    .double_sided()
                    .with_flags(MaterialFlags::NO_DEPTH_WRITE | MaterialFlags::NO_FOG),
            )
            .with_transform(Transform::from_translation(Vec3::new(0.0, SKY_Y, 0.0)))
            .render_order(-1)
            .always_draw()
            .spawn(registry);
    }

    let cap = add_mesh(assets, "sky-cap", geometry::circle(SKY_CAP_RADIUS, 64));
    EntityBuilder::new()
        .with_name("sky-cap")
        .with_mesh(cap)
        .with_material(Material::from_hex(SKY_CAP_COLOR).unlit().with_flags(MaterialFlags::NO_FOG))
        .with_transform(
            Transform::from_translation(Vec3::new(0.0, SKY_CAP_Y, 0.0))
                .with_rotation(Quat::from_rotation_x(FRAC_PI_2)),
        )
        .render_order(-1)
        .always_draw()
        .spawn(registry);

    if let Some(texture) = load_texture(assets, &settings.ground_texture, SamplerOptions::repeat()) {
        let mut ground = geometry::circle(GROUND_RADIUS, 64);
        geometry::transform_uvs(&mut ground.0, Vec2::splat(GROUND_REPEAT), FRAC_PI_2);
        let mesh = add_mesh(assets, "ground", ground);
        EntityBuilder::new()
            .with_name("ground")
            .with_mesh(mesh)
            .with_material(Material::textured(texture).double_sided())
            .with_transform(
                Transform::from_translation(Vec3::new(0.0, GROUND_Y, 0.0))
                    .with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
            )
            .spawn(registry);
    }
}

/// Round table top under the model, centered on the origin.
pub fn spawn_table(registry: &mut SceneRegistry, assets: &mut Assets) -> Entity {
    let mesh = add_mesh(
        assets,
        "table",
        geometry::cylinder(TABLE_RADIUS, TABLE_RADIUS, TABLE_HEIGHT, 32, false),
    );
    EntityBuilder::new()
        .with_name("table")
        .with_mesh(mesh)
        .with_material(Material::from_hex(TABLE_COLOR))
        .spawn(registry)
}

/// Framed photos standing around the table, each turned to face its center.
pub fn spawn_photos(registry: &mut SceneRegistry, assets: &mut Assets, photos: &[PhotoSettings]) -> Vec<Entity> {
    let mut spawned = Vec::with_capacity(photos.len());
    if photos.is_empty() {
        return spawned;
    }
    let mesh = add_mesh(assets, "photo", geometry::plane(PHOTO_SIZE.x, PHOTO_SIZE.y));

    for (i, photo) in photos.iter().enumerate() {
        let Some(texture) = load_texture(assets, &photo.texture, SamplerOptions::clamp()) else {
            continue;
        };
        // Frames all hang at eye height regardless of the configured y.
        let position = Vec3::new(photo.position[0], PHOTO_LOOK_AT.y, photo.position[2]);
        let transform = Transform::from_translation(position).looking_at(PHOTO_LOOK_AT, Vec3::Y);
        spawned.push(
            EntityBuilder::new()
                .with_name(format!("photo-{}", i))
                .with_mesh(mesh)
                .with_material(Material::textured(texture).double_sided())
                .with_transform(transform)
                .spawn(registry),
        );
    }
    spawned
}

/// The pickable greeting card. `texture` is `None` when the card image
/// could not be loaded; the card is then drawn plain white.
pub fn spawn_card(
    registry: &mut SceneRegistry,
    assets: &mut Assets,
    settings: &CardSettings,
    texture: Option<Handle<ImageData>>,
) -> Entity {
    let mesh = add_mesh(assets, "card", geometry::plane(settings.size[0], settings.size[1]));
    let material = texture.map(Material::textured).unwrap_or_default().double_sided();
    EntityBuilder::new()
        .with_name(settings.name.clone())
        .with_mesh(mesh)
        .with_material(material)
        .with_transform(
            Transform::from_translation(Vec3::from(settings.position))
                .with_rotation(Quat::from_rotation_x(settings.tilt)),
        )
        .pickable()
        .spawn(registry)
}

/// Build the whole static set.
pub fn dress(
    registry: &mut SceneRegistry,
    assets: &mut Assets,
    backdrop: &BackdropSettings,
    photos: &[PhotoSettings],
    card: &CardSettings,
) -> Dressing {
    spawn_backdrop(registry, assets, backdrop);
    spawn_table(registry, assets);
    spawn_photos(registry, assets, photos);

    let card_texture = load_texture(assets, &card.texture, SamplerOptions::clamp());
    let card_entity = spawn_card(registry, assets, card, card_texture);
    log::info!("Scene dressed with {} entities", registry.len());

    Dressing {
        card: Some(card_entity),
        card_texture,
    }
}
