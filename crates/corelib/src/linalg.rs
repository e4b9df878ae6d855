//! Small linear-algebra toolkit over glam value types.
//!
//! Conventions: column-major `Mat4`, left-handed view space (+Z into the
//! screen), clip depth in `[0, 1]`. Quaternions are stored `(x, y, z, w)`.
//! Every function here is pure and total.

use crate::{Mat4, Quat, Vec3, Vec4};

/// Magnitudes below this are treated as zero when normalizing.
pub const EPSILON: f32 = 1e-5;

pub const RAD_PER_DEG: f32 = std::f32::consts::PI / 180.0;

pub const Y_UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);
pub const FORWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);
/// Strafe axis. With a left-handed look-at this is screen-left.
pub const LEFT: Vec3 = Vec3::new(1.0, 0.0, 0.0);

/// Floating modulo into `[0, y)`.
#[inline]
pub fn wrap(x: f32, y: f32) -> f32 {
    let r = x % y;
    if r >= 0.0 {
        return r;
    }
    // Tiny negative remainders round `y + r` up to `y`.
    let w = y + r;
    if w >= y { 0.0 } else { w }
}

#[inline]
pub fn rad(deg: f32) -> f32 {
    deg * RAD_PER_DEG
}

#[inline]
pub fn deg(rad: f32) -> f32 {
    rad / RAD_PER_DEG
}

/// Unit vector in the direction of `v`, or zero when `|v| < EPSILON`.
#[inline]
pub fn normalize_or_zero(v: Vec3) -> Vec3 {
    let norm = v.length();
    if norm < EPSILON {
        return Vec3::ZERO;
    }
    v * (1.0 / norm)
}

#[inline]
pub fn cross_normalized(a: Vec3, b: Vec3) -> Vec3 {
    normalize_or_zero(a.cross(b))
}

/// Multiply `(v, w)` by `m` and drop the fourth component.
/// `w = 0` transforms a direction, `w = 1` a point.
#[inline]
pub fn transform_vector(m: &Mat4, v: Vec3, w: f32) -> Vec3 {
    (*m * Vec4::new(v.x, v.y, v.z, w)).truncate()
}

#[inline]
pub fn mat4_mul(a: &Mat4, b: &Mat4) -> Mat4 {
    *a * *b
}

/// Left-to-right product `m[0] * m[1] * ... * m[n-1]`.
/// An empty chain is the identity.
pub fn mat4_mul_n(matrices: &[Mat4]) -> Mat4 {
    match matrices {
        [] => Mat4::IDENTITY,
        [first, rest @ ..] => rest.iter().fold(*first, |acc, m| mat4_mul(&acc, m)),
    }
}

#[inline]
pub fn mat4_translate(t: Vec3) -> Mat4 {
    let mut m = Mat4::IDENTITY;
    m.w_axis = Vec4::new(t.x, t.y, t.z, 1.0);
    m
}

#[inline]
pub fn mat4_scale(s: Vec3) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(s.x, 0.0, 0.0, 0.0),
        Vec4::new(0.0, s.y, 0.0, 0.0),
        Vec4::new(0.0, 0.0, s.z, 0.0),
        Vec4::W,
    )
}

/// Rotation matrix of a unit quaternion.
pub fn mat4_from_quat(q: Quat) -> Mat4 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, xz, yz) = (x * y, x * z, y * z);
    let (wx, wy, wz) = (w * x, w * y, w * z);

    Mat4::from_cols(
        Vec4::new(1.0 - 2.0 * (yy + zz), 2.0 * (xy + wz), 2.0 * (xz - wy), 0.0),
        Vec4::new(2.0 * (xy - wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz + wx), 0.0),
        Vec4::new(2.0 * (xz + wy), 2.0 * (yz - wx), 1.0 - 2.0 * (xx + yy), 0.0),
        Vec4::W,
    )
}

/// Model matrix `T * R * S`.
pub fn mat4_from_trs(t: Vec3, r: Quat, s: Vec3) -> Mat4 {
    mat4_mul_n(&[mat4_translate(t), mat4_from_quat(r), mat4_scale(s)])
}

/// Rodrigues rotation of `angle` radians about `axis` (normalized here).
pub fn rotate_axis_angle(angle: f32, axis: Vec3) -> Mat4 {
    let a = normalize_or_zero(axis);
    let (s, c) = angle.sin_cos();
    let v = a * (1.0 - c);
    let vs = a * s;

    let mut x = a * v.x;
    let mut y = a * v.y;
    let mut z = a * v.z;

    x.x += c;
    x.y += vs.z;
    x.z -= vs.y;

    y.x -= vs.z;
    y.y += c;
    y.z += vs.x;

    z.x += vs.y;
    z.y -= vs.x;
    z.z += c;

    Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), Vec4::W)
}

/// Quaternion rotating `angle` radians about `axis` (normalized here).
pub fn quat_angle_axis(angle: f32, axis: Vec3) -> Quat {
    let half = angle * 0.5;
    let v = normalize_or_zero(axis) * half.sin();
    Quat::from_xyzw(v.x, v.y, v.z, half.cos())
}

/// Hamilton product `p ⊗ q`: applying the result rotates by `q` first, then `p`.
pub fn quat_mul(p: Quat, q: Quat) -> Quat {
    Quat::from_xyzw(
        p.w * q.x + p.x * q.w + p.y * q.z - p.z * q.y,
        p.w * q.y - p.x * q.z + p.y * q.w + p.z * q.x,
        p.w * q.z + p.x * q.y - p.y * q.x + p.z * q.w,
        p.w * q.w - p.x * q.x - p.y * q.y - p.z * q.z,
    )
}

/// Left-handed perspective projection with `[0, 1]` depth.
pub fn perspective_lh_zo(fovy: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fovy * 0.5).tan();
    let fn_ = 1.0 / (near - far);

    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, -far * fn_, 1.0),
        Vec4::new(0.0, 0.0, near * far * fn_, 0.0),
    )
}

/// Left-handed view matrix looking from `eye` towards `center`.
pub fn look_at_lh(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
    let f = normalize_or_zero(center - eye);
    let s = cross_normalized(up, f);
    let u = f.cross(s);

    Mat4::from_cols(
        Vec4::new(s.x, u.x, f.x, 0.0),
        Vec4::new(s.y, u.y, f.y, 0.0),
        Vec4::new(s.z, u.z, f.z, 0.0),
        Vec4::new(-s.dot(eye), -u.dot(eye), -f.dot(eye), 1.0),
    )
}

/// Rotation `Rx(angles.x) * Ry(angles.y) * Rz(angles.z)`.
pub fn euler_xyz(angles: Vec3) -> Mat4 {
    let (sx, cx) = angles.x.sin_cos();
    let (sy, cy) = angles.y.sin_cos();
    let (sz, cz) = angles.z.sin_cos();

    let czsx = cz * sx;
    let cxcz = cx * cz;
    let sysz = sy * sz;

    Mat4::from_cols(
        Vec4::new(cy * cz, czsx * sy + cx * sz, -cxcz * sy + sx * sz, 0.0),
        Vec4::new(-cy * sz, cxcz - sx * sysz, czsx + cx * sysz, 0.0),
        Vec4::new(sy, -cy * sx, cx * cy, 0.0),
        Vec4::W,
    )
}
