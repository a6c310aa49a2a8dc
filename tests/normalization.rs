//! Model placement against a small hierarchy with non-trivial child
//! transforms.

use glam::{Quat, Vec3};

use greeting_scene::asset::{mesh::v, Assets, Handle, MeshData};
use greeting_scene::normalize::{AssetNormalizer, NormalizeTarget};
use greeting_scene::renderer::Material;
use greeting_scene::scene::{EntityBuilder, SceneRegistry, Transform};

const EPS: f32 = 1e-4;

fn cube(assets: &mut Assets, half: f32) -> Handle<MeshData> {
    let n = [0.0, 1.0, 0.0];
    let mut vertices = Vec::with_capacity(8);
    for &x in &[-half, half] {
        for &y in &[-half, half] {
            for &z in &[-half, half] {
                vertices.push(v([x, y, z], n, [0.0, 0.0]));
            }
        }
    }
    let indices = vec![0, 1, 2, 2, 1, 3, 4, 6, 5, 5, 6, 7];
    assets.meshes.insert(MeshData::new("cube", vertices, indices))
}

/// Two cubes under a hidden root, one offset and one rotated, as a
/// loaded model would arrive.
fn model() -> (SceneRegistry, Assets, hecs::Entity) {
    let mut registry = SceneRegistry::new();
    let mut assets = Assets::new();
    let mesh = cube(&mut assets, 1.0);

    let root = EntityBuilder::new()
        .with_name("model")
        .visible(false)
        .spawn(&mut registry);
    EntityBuilder::new()
        .with_mesh(mesh)
        .with_material(Material::white())
        .with_transform(Transform::from_translation(Vec3::new(10.0, 3.0, -4.0)))
        .child_of(root)
        .spawn(&mut registry);
    EntityBuilder::new()
        .with_mesh(mesh)
        .with_material(Material::white())
        .with_transform(
            Transform::from_translation(Vec3::new(14.0, 3.0, -4.0))
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        )
        .child_of(root)
        .spawn(&mut registry);
    registry.propagate_transforms();
    (registry, assets, root)
}

#[test]
fn hierarchy_fits_the_target_and_rests_on_the_offset() {
    let (mut registry, assets, root) = model();
    let target = NormalizeTarget::new(1.2, Vec3::new(0.35, 0.25, 1.0)).unwrap();

    let before = AssetNormalizer::measure(&registry, &assets, root).unwrap();
    // x spans 9..15, the widest axis.
    assert!((before.max_extent() - 6.0).abs() < EPS);

    let result = AssetNormalizer::new(target).run(&mut registry, &assets, root).unwrap();
    assert!((result.scale_factor - 0.2).abs() < EPS);

    let after = AssetNormalizer::measure(&registry, &assets, root).unwrap();
    assert!((after.max_extent() - 1.2).abs() < EPS);
    assert!((after.min.y - 0.25).abs() < EPS);
    // Horizontally centered on the offset.
    assert!((after.center().x - 0.35).abs() < EPS);
    assert!((after.center().z - 1.0).abs() < EPS);
    assert!(registry.is_visible(root));
}

#[test]
fn running_twice_leaves_the_model_where_it_is() {
    let (mut registry, assets, root) = model();
    let target = NormalizeTarget::new(2.5, Vec3::ZERO).unwrap();
    let normalizer = AssetNormalizer::new(target);

    normalizer.run(&mut registry, &assets, root).unwrap();
    let first = AssetNormalizer::measure(&registry, &assets, root).unwrap();
    let placed = registry.local_transform(root).unwrap();
    let again = normalizer.run(&mut registry, &assets, root).unwrap();
    let second = AssetNormalizer::measure(&registry, &assets, root).unwrap();
    let replaced = registry.local_transform(root).unwrap();

    assert!((again.scale_factor - 1.0).abs() < EPS);
    assert!(first.abs_diff_eq(&second, EPS));
    assert!(replaced.translation.abs_diff_eq(placed.translation, EPS));
    assert!(again.final_position.abs_diff_eq(placed.translation, EPS));
}
