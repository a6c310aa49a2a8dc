use glam::{Mat3, Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            translation: t,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn translate(&mut self, by: Vec3) {
        self.translation += by;
    }

    /// Uniform scale about the parent-space origin: both the existing scale
    /// and the translation are multiplied, so a point at the origin stays put
    /// and everything else moves towards or away from it.
    pub fn scale_about_origin(&mut self, factor: f32) {
        self.translation *= factor;
        self.scale *= factor;
    }

    /// Rotate so local +Z points from `translation` towards `target`.
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let Some(forward) = (target - self.translation).try_normalize() else {
            return self;
        };
        let right = up.cross(forward).try_normalize().unwrap_or(Vec3::X);
        let up = forward.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, up, forward));
        self
    }
}
