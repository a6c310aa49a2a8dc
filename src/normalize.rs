//! Fits an arbitrarily authored model to a fixed footprint at a fixed spot.
//!
//! The work is a named pipeline, each step re-measuring the real
//! transformed geometry rather than predicting it:
//!
//! 1. [`AssetNormalizer::center`]: move the bounds center to the origin.
//! 2. [`AssetNormalizer::scale`]: uniform scale so the largest extent is the target size.
//! 3. [`AssetNormalizer::remeasure`]: bounds of the scaled geometry.
//! 4. [`AssetNormalizer::rest`]: lift so the lowest point touches y = 0.
//! 5. [`AssetNormalizer::offset`]: shift by the placement offset.
//!
//! All steps act on the model's root entity, which must be a scene root.

use glam::Vec3;
use hecs::Entity;

use crate::asset::Assets;
use crate::error::NormalizeError;
use crate::renderer::MaterialFlags;
use crate::scene::{Aabb, AlwaysDraw, MaterialComponent, MeshComponent, SceneRegistry};
use crate::settings::ModelSettings;

/// Where and how large the model should end up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeTarget {
    pub target_size: f32,
    pub offset: Vec3,
}

impl NormalizeTarget {
    pub fn new(target_size: f32, offset: Vec3) -> Result<Self, NormalizeError> {
        if !target_size.is_finite() || target_size <= 0.0 {
            return Err(NormalizeError::InvalidTargetSize(target_size));
        }
        Ok(Self { target_size, offset })
    }

    pub fn from_settings(settings: &ModelSettings) -> Result<Self, NormalizeError> {
        Self::new(settings.target_size, settings.placement_offset())
    }
}

/// What one normalization did. Derived each run, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationResult {
    /// Translation applied by the centering step.
    pub center_offset: Vec3,
    pub scale_factor: f32,
    /// Upward translation applied by the rest step.
    pub ground_offset: f32,
    /// Root translation once every step has run.
    pub final_position: Vec3,
}

fn checked_extent(bounds: &Aabb) -> Result<f32, NormalizeError> {
    let extent = bounds.max_extent();
    if !extent.is_finite() || extent <= f32::EPSILON {
        return Err(NormalizeError::DegenerateBounds { size: bounds.size() });
    }
    Ok(extent)
}

/// The whole pipeline on bounds alone, for a root starting at the identity.
/// [`AssetNormalizer::run`] must agree with this on any model.
pub fn plan(bounds: &Aabb, target: &NormalizeTarget) -> Result<NormalizationResult, NormalizeError> {
    let center_offset = -bounds.center();
    let centered = bounds.translated(center_offset);

    let scale_factor = target.target_size / checked_extent(&centered)?;
    let scaled = centered.scaled(scale_factor);

    let ground_offset = -scaled.min.y;
    let final_position =
        center_offset * scale_factor + Vec3::new(0.0, ground_offset, 0.0) + target.offset;

    Ok(NormalizationResult {
        center_offset,
        scale_factor,
        ground_offset,
        final_position,
    })
}

/// Runs the placement pipeline against entities in a [`SceneRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct AssetNormalizer {
    target: NormalizeTarget,
}

impl AssetNormalizer {
    pub fn new(target: NormalizeTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &NormalizeTarget {
        &self.target
    }

    /// Current world bounds of everything under `root`.
    pub fn measure(
        registry: &SceneRegistry,
        assets: &Assets,
        root: Entity,
    ) -> Result<Aabb, NormalizeError> {
        if !registry.contains(root) {
            return Err(NormalizeError::MissingRoot);
        }
        registry
            .subtree_bounds(root, assets)
            .ok_or(NormalizeError::EmptyAsset)
    }

    fn translate(registry: &mut SceneRegistry, root: Entity, by: Vec3) -> Result<(), NormalizeError> {
        if registry.update_transform(root, |t| t.translate(by)) {
            Ok(())
        } else {
            Err(NormalizeError::MissingRoot)
        }
    }

    /// Step 1. Returns the applied translation.
    pub fn center(
        &self,
        registry: &mut SceneRegistry,
        assets: &Assets,
        root: Entity,
    ) -> Result<Vec3, NormalizeError> {
        let bounds = Self::measure(registry, assets, root)?;
        let offset = -bounds.center();
        Self::translate(registry, root, offset)?;
        log::debug!("normalize: centered by {:?}", offset);
        Ok(offset)
    }

    /// Step 2. Uniform scale about the origin; the centered bounds stay
    /// centered. Returns the factor.
    pub fn scale(
        &self,
        registry: &mut SceneRegistry,
        assets: &Assets,
        root: Entity,
    ) -> Result<f32, NormalizeError> {
        let bounds = Self::measure(registry, assets, root)?;
        let factor = self.target.target_size / checked_extent(&bounds)?;
        if !registry.update_transform(root, |t| t.scale_about_origin(factor)) {
            return Err(NormalizeError::MissingRoot);
        }
        log::debug!(
            "normalize: scaled by {} (largest extent {})",
            factor,
            bounds.max_extent()
        );
        Ok(factor)
    }

    /// Step 3.
    pub fn remeasure(
        &self,
        registry: &SceneRegistry,
        assets: &Assets,
        root: Entity,
    ) -> Result<Aabb, NormalizeError> {
        let bounds = Self::measure(registry, assets, root)?;
        log::debug!("normalize: re-measured {:?}", bounds);
        Ok(bounds)
    }

    /// Step 4. Lift by the negated minimum y of the re-measured bounds.
    pub fn rest(
        &self,
        registry: &mut SceneRegistry,
        root: Entity,
        remeasured: &Aabb,
    ) -> Result<f32, NormalizeError> {
        let lift = -remeasured.min.y;
        Self::translate(registry, root, Vec3::new(0.0, lift, 0.0))?;
        log::debug!("normalize: rested with lift {}", lift);
        Ok(lift)
    }

    /// Step 5.
    pub fn offset(&self, registry: &mut SceneRegistry, root: Entity) -> Result<Vec3, NormalizeError> {
        Self::translate(registry, root, self.target.offset)?;
        registry
            .local_transform(root)
            .map(|t| t.translation)
            .ok_or(NormalizeError::MissingRoot)
    }

    /// Every mesh under `root` renders both faces and is never culled.
    pub fn mark_render_flags(registry: &mut SceneRegistry, root: Entity) {
        let mut meshes = Vec::new();
        registry.traverse(root, |e| meshes.push(e));

        let world = registry.world_mut();
        for entity in meshes {
            if let Ok(mut material) = world.get::<&mut MaterialComponent>(entity) {
                material.0.flags |= MaterialFlags::DOUBLE_SIDED;
            }
            if world.get::<&MeshComponent>(entity).is_ok() {
                if let Err(err) = world.insert_one(entity, AlwaysDraw) {
                    log::warn!("Could not exempt {:?} from culling: {:?}", entity, err);
                }
            }
        }
    }

    /// All five steps plus the render flags, then show the model. Runs
    /// without yielding, so no frame ever sees a partly placed model.
    pub fn run(
        &self,
        registry: &mut SceneRegistry,
        assets: &Assets,
        root: Entity,
    ) -> Result<NormalizationResult, NormalizeError> {
        let center_offset = self.center(registry, assets, root)?;
        let scale_factor = self.scale(registry, assets, root)?;
        let remeasured = self.remeasure(registry, assets, root)?;
        let ground_offset = self.rest(registry, root, &remeasured)?;
        let final_position = self.offset(registry, root)?;

        Self::mark_render_flags(registry, root);
        registry.set_visible(root, true);
        registry.propagate_transforms();

        let result = NormalizationResult {
            center_offset,
            scale_factor,
            ground_offset,
            final_position,
        };
        log::info!(
            "Model normalized: scale {:.4}, placed at {:?}",
            result.scale_factor,
            result.final_position
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{mesh::v, Handle, MeshData};
    use crate::renderer::Material;
    use crate::scene::EntityBuilder;

    const EPS: f32 = 1e-5;

    fn boxed_mesh(assets: &mut Assets, min: Vec3, max: Vec3) -> Handle<MeshData> {
        let n = [0.0, 1.0, 0.0];
        let vertices = vec![
            v(min.to_array(), n, [0.0, 0.0]),
            v(max.to_array(), n, [1.0, 1.0]),
            v([min.x, max.y, min.z], n, [0.0, 1.0]),
        ];
        assets.meshes.insert(MeshData::new("box", vertices, vec![0, 1, 2]))
    }

    fn example() -> (SceneRegistry, Assets, Entity, Entity) {
        let mut registry = SceneRegistry::new();
        let mut assets = Assets::new();
        let mesh = boxed_mesh(&mut assets, Vec3::new(-2.0, -1.0, -3.0), Vec3::new(4.0, 5.0, 1.0));
        let root = EntityBuilder::new().visible(false).spawn(&mut registry);
        let child = EntityBuilder::new()
            .with_mesh(mesh)
            .with_material(Material::white())
            .child_of(root)
            .spawn(&mut registry);
        (registry, assets, root, child)
    }

    fn target() -> NormalizeTarget {
        NormalizeTarget::new(1.2, Vec3::new(0.35, 0.25, 1.0)).unwrap()
    }

    #[test]
    fn plan_for_reference_box() {
        let bounds = Aabb::new(Vec3::new(-2.0, -1.0, -3.0), Vec3::new(4.0, 5.0, 1.0));
        let result = plan(&bounds, &target()).unwrap();
        assert!((result.scale_factor - 0.2).abs() < EPS);
        assert!(result.center_offset.abs_diff_eq(Vec3::new(-1.0, -2.0, 1.0), EPS));
        // Scaled height is 1.2, so the lift is half of it.
        assert!((result.ground_offset - 0.6).abs() < EPS);
        assert!(result
            .final_position
            .abs_diff_eq(Vec3::new(-0.2 + 0.35, -0.4 + 0.6 + 0.25, 0.2 + 1.0), EPS));
    }

    #[test]
    fn centered_before_rest_and_offset() {
        let (mut registry, assets, root, _) = example();
        let normalizer = AssetNormalizer::new(target());

        normalizer.center(&mut registry, &assets, root).unwrap();
        let centered = AssetNormalizer::measure(&registry, &assets, root).unwrap();
        assert!(centered.center().abs_diff_eq(Vec3::ZERO, EPS));

        let factor = normalizer.scale(&mut registry, &assets, root).unwrap();
        assert!((factor - 0.2).abs() < EPS);

        let scaled = normalizer.remeasure(&registry, &assets, root).unwrap();
        assert!(scaled.center().abs_diff_eq(Vec3::ZERO, EPS));
        assert!((scaled.max_extent() - 1.2).abs() < EPS);
    }

    #[test]
    fn min_y_lands_on_ground_offset() {
        let (mut registry, assets, root, _) = example();
        let normalizer = AssetNormalizer::new(target());
        normalizer.run(&mut registry, &assets, root).unwrap();

        let bounds = AssetNormalizer::measure(&registry, &assets, root).unwrap();
        assert!((bounds.min.y - 0.25).abs() < EPS);
        assert!((bounds.max_extent() - 1.2).abs() < EPS);
        assert!(registry.is_visible(root));
    }

    #[test]
    fn pipeline_matches_pure_plan() {
        let (mut registry, assets, root, _) = example();
        let before = AssetNormalizer::measure(&registry, &assets, root).unwrap();
        let planned = plan(&before, &target()).unwrap();
        let actual = AssetNormalizer::new(target()).run(&mut registry, &assets, root).unwrap();

        assert!((planned.scale_factor - actual.scale_factor).abs() < EPS);
        assert!((planned.ground_offset - actual.ground_offset).abs() < EPS);
        assert!(planned.final_position.abs_diff_eq(actual.final_position, EPS));
    }

    #[test]
    fn second_run_is_a_fixed_point() {
        let (mut registry, assets, root, _) = example();
        let normalizer = AssetNormalizer::new(target());
        let first = normalizer.run(&mut registry, &assets, root).unwrap();
        let placed = registry.local_transform(root).unwrap();
        let second = normalizer.run(&mut registry, &assets, root).unwrap();
        let replaced = registry.local_transform(root).unwrap();

        assert!((second.scale_factor - 1.0).abs() < EPS);
        assert!(second.final_position.abs_diff_eq(first.final_position, EPS));
        // Centering and resting cancel out; the root does not move.
        assert!(replaced.translation.abs_diff_eq(placed.translation, EPS));
        assert!(replaced.scale.abs_diff_eq(placed.scale, EPS));
    }

    #[test]
    fn scale_commutes_with_centering() {
        // Scaling the raw geometry first and centering afterwards lands
        // on the same box as center-then-scale.
        let raw = Aabb::new(Vec3::new(-2.0, -1.0, -3.0), Vec3::new(4.0, 5.0, 1.0));
        let f = 0.2;
        let scaled_first = raw.scaled(f);
        let a = scaled_first.translated(-scaled_first.center());
        let b = raw.translated(-raw.center()).scaled(f);
        assert!(a.abs_diff_eq(&b, EPS));
    }

    #[test]
    fn meshes_become_double_sided_and_unculled() {
        let (mut registry, assets, root, child) = example();
        AssetNormalizer::new(target()).run(&mut registry, &assets, root).unwrap();

        let world = registry.world();
        let material = world.get::<&MaterialComponent>(child).unwrap().0;
        assert!(material.is_double_sided());
        assert!(world.get::<&AlwaysDraw>(child).is_ok());
    }

    #[test]
    fn rejects_degenerate_and_empty_models() {
        let mut registry = SceneRegistry::new();
        let mut assets = Assets::new();
        let flat = boxed_mesh(&mut assets, Vec3::ZERO, Vec3::ZERO);
        let root = EntityBuilder::new().spawn(&mut registry);
        EntityBuilder::new().with_mesh(flat).child_of(root).spawn(&mut registry);
        let normalizer = AssetNormalizer::new(target());
        assert!(matches!(
            normalizer.run(&mut registry, &assets, root),
            Err(NormalizeError::DegenerateBounds { .. })
        ));

        let empty = EntityBuilder::new().spawn(&mut registry);
        assert_eq!(
            normalizer.run(&mut registry, &assets, empty),
            Err(NormalizeError::EmptyAsset)
        );

        registry.remove(empty);
        assert_eq!(
            normalizer.run(&mut registry, &assets, empty),
            Err(NormalizeError::MissingRoot)
        );
    }

    #[test]
    fn target_size_must_be_positive() {
        assert!(NormalizeTarget::new(0.0, Vec3::ZERO).is_err());
        assert!(NormalizeTarget::new(f32::NAN, Vec3::ZERO).is_err());
        assert!(NormalizeTarget::from_settings(&ModelSettings::default()).is_ok());
    }
}
