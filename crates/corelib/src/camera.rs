use crate::linalg::{
    FORWARD, LEFT, Y_UP, euler_xyz, look_at_lh, mat4_mul, normalize_or_zero, perspective_lh_zo,
    rad, transform_vector, wrap,
};
use crate::{Mat4, Vec2, Vec3};

/// Pitch is kept strictly inside the poles so the look-at basis never degenerates.
pub const PITCH_LIMIT_DEG: f32 = 89.0;

/// Simple perspective camera (left-handed, depth 0..1).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new_perspective(
        position: Vec3,
        target: Vec3,
        fov_y_rad: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up: Y_UP,
            fov_y_rad,
            z_near,
            z_far,
        }
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        look_at_lh(self.position, self.target, self.up)
    }

    #[inline]
    pub fn proj(&self, aspect: f32) -> Mat4 {
        perspective_lh_zo(self.fov_y_rad, aspect.max(1e-6), self.z_near, self.z_far)
    }

    #[inline]
    pub fn proj_view(&self, aspect: f32) -> Mat4 {
        mat4_mul(&self.proj(aspect), &self.view())
    }

    /// Move on the ground plane along `axis` (x: strafe left, y: forward)
    /// and aim at one unit ahead of the new position.
    pub fn fly(&mut self, look: &Look, axis: Vec2, speed: f32, dt: f32) {
        let forward = look.forward();
        let mut dir = forward * axis.y + look.left() * axis.x;
        dir.y = 0.0;
        let dir = normalize_or_zero(dir);

        self.position += dir * (speed * dt);
        self.target = self.position + forward;
    }
}

/// Mouse-look orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Look {
    pub yaw: f32,
    pub pitch: f32,
}

impl Look {
    /// Yaw wraps to `[0, 360)`, pitch clamps to ±[`PITCH_LIMIT_DEG`].
    pub fn apply_mouse(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw = wrap(self.yaw + delta.x * sensitivity, 360.0);
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
    }

    /// Pitch about X, then yaw about world Y.
    pub fn matrix(&self) -> Mat4 {
        let yaw = euler_xyz(Vec3::new(0.0, rad(self.yaw), 0.0));
        let pitch = euler_xyz(Vec3::new(rad(self.pitch), 0.0, 0.0));
        mat4_mul(&yaw, &pitch)
    }

    #[inline]
    pub fn forward(&self) -> Vec3 {
        transform_vector(&self.matrix(), FORWARD, 0.0)
    }

    #[inline]
    pub fn left(&self) -> Vec3 {
        transform_vector(&self.matrix(), LEFT, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn yaw_wraps_and_pitch_clamps() {
        let mut look = Look { yaw: 350.0, pitch: 80.0 };
        look.apply_mouse(Vec2::new(100.0, -100.0), 0.3);
        assert!((look.yaw - 20.0).abs() < 1e-4);
        assert_eq!(look.pitch, PITCH_LIMIT_DEG);

        look.apply_mouse(Vec2::new(-100.0, 1000.0), 0.3);
        assert!((look.yaw - 350.0).abs() < 1e-4);
        assert_eq!(look.pitch, -PITCH_LIMIT_DEG);
    }

    #[test]
    fn neutral_look_faces_forward() {
        let look = Look::default();
        assert!(close(look.forward(), FORWARD));
        assert!(close(look.left(), LEFT));
    }

    #[test]
    fn pitch_tilts_forward_at_any_heading() {
        let look = Look { yaw: 90.0, pitch: 30.0 };
        let f = look.forward();
        assert!((f.y - rad(30.0).sin()).abs() < 1e-5);
        assert!((f.length() - 1.0).abs() < 1e-5);
        // Turned a quarter to the right of -Z.
        assert!(f.x < -0.8);
    }

    #[test]
    fn flying_stays_on_ground_plane() {
        let mut cam = Camera::new_perspective(
            vec3(0.0, 1.0, 3.0),
            vec3(0.0, 1.0, 0.0),
            rad(60.0),
            0.01,
            1000.0,
        );
        let look = Look { yaw: 0.0, pitch: 45.0 };
        cam.fly(&look, Vec2::new(0.0, 1.0), 5.0, 0.5);

        assert!(close(cam.position, vec3(0.0, 1.0, 0.5)));
        assert!(close(cam.target, cam.position + look.forward()));
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut cam = Camera::new_perspective(Vec3::ZERO, FORWARD, rad(60.0), 0.01, 1000.0);
        cam.fly(&Look::default(), Vec2::new(1.0, 1.0), 5.0, 1.0);
        assert!((cam.position.length() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn no_input_keeps_position_but_updates_target() {
        let mut cam = Camera::new_perspective(
            vec3(1.0, 1.0, 1.0),
            Vec3::ZERO,
            rad(60.0),
            0.01,
            1000.0,
        );
        let look = Look { yaw: 180.0, pitch: 0.0 };
        cam.fly(&look, Vec2::ZERO, 5.0, 1.0);
        assert!(close(cam.position, vec3(1.0, 1.0, 1.0)));
        assert!(close(cam.target, vec3(1.0, 1.0, 2.0)));
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = Camera::new_perspective(
            vec3(0.0, 1.0, 3.0),
            vec3(0.0, 1.0, 0.0),
            60f32.to_radians(),
            0.01,
            1000.0,
        );
        let pv = cam.proj_view(1280.0 / 780.0);
        assert!(pv.to_cols_array().iter().all(|f| f.is_finite()));
    }
}
