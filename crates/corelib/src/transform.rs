use crate::linalg::{Y_UP, mat4_from_trs, quat_angle_axis, quat_mul, rad};
use crate::{Mat4, Quat, Vec3};

/// World placement: translation, unit-quaternion rotation, scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Placed at `translation`, turned `yaw_deg` degrees about +Y, unit scale.
    pub fn from_position_yaw(translation: Vec3, yaw_deg: f32) -> Self {
        Self::from_trs(translation, quat_angle_axis(rad(yaw_deg), Y_UP), Vec3::ONE)
    }

    /// Compose an extra local rotation: `rotation = rotation ⊗ delta`.
    /// The result is renormalized to unit length.
    #[inline]
    pub fn rotate_local(&mut self, delta: Quat) {
        self.rotation = quat_mul(self.rotation, delta).normalize();
    }

    /// Build matrix = T * R * S (column-major).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        mat4_from_trs(self.translation, self.rotation, self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::transform_vector;
    use crate::vec3;

    #[test]
    fn default_places_nothing() {
        assert_eq!(Transform::default().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn scale_applies_before_translation() {
        let t = Transform::from_trs(vec3(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(2.0));
        let p = transform_vector(&t.matrix(), vec3(1.0, 1.0, 1.0), 1.0);
        assert!(p.abs_diff_eq(vec3(3.0, 4.0, 5.0), 1e-6));
        // Directions ignore the translation column.
        let d = transform_vector(&t.matrix(), vec3(1.0, 0.0, 0.0), 0.0);
        assert!(d.abs_diff_eq(vec3(2.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn yaw_turns_about_up_without_moving_origin() {
        let t = Transform::from_position_yaw(vec3(2.5, 0.0, 0.0), 90.0);
        let origin = transform_vector(&t.matrix(), Vec3::ZERO, 1.0);
        assert!(origin.abs_diff_eq(vec3(2.5, 0.0, 0.0), 1e-6));
        let x = transform_vector(&t.matrix(), Vec3::X, 0.0);
        assert!(x.abs_diff_eq(vec3(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn local_rotations_accumulate() {
        let mut t = Transform::from_position_yaw(Vec3::ZERO, 30.0);
        t.rotate_local(quat_angle_axis(rad(60.0), Y_UP));
        let expected = Quat::from_rotation_y(rad(90.0));
        assert!(t.rotation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn long_spin_keeps_unit_rotation() {
        let mut t = Transform::default();
        let step = quat_angle_axis(rad(90.0 / 60.0), Y_UP);
        for _ in 0..60 * 60 * 60 {
            t.rotate_local(step);
        }
        assert!((t.rotation.length() - 1.0).abs() < 1e-5);
        let x = transform_vector(&t.matrix(), Vec3::X, 0.0);
        assert!((x.length() - 1.0).abs() < 1e-4);
    }
}
