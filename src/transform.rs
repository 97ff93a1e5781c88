//! 4x4 row-major transforms and the process-wide current transform.

use crate::context::with_context;

const SINGULAR_EPSILON: f32 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub m: [f32; 16],
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

impl Transform {
    pub fn identity() -> Transform {
        let mut m = [0.0; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Transform { m }
    }

    fn determinant_and_adjugate(&self) -> (f32, [f32; 16]) {
        let m = &self.m;
        let mut inv = [0.0f32; 16];

        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14] + m[13] * m[6] * m[11] - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14] - m[12] * m[6] * m[11] + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13] + m[12] * m[5] * m[11] - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13] - m[12] * m[5] * m[10] + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14] - m[13] * m[2] * m[11] + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14] + m[12] * m[2] * m[11] - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13] - m[12] * m[1] * m[11] + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13] + m[12] * m[1] * m[10] - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14] + m[13] * m[2] * m[7] - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14] - m[12] * m[2] * m[7] + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13] + m[12] * m[1] * m[7] - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13] - m[12] * m[1] * m[6] + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10] - m[9] * m[2] * m[7] + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10] + m[8] * m[2] * m[7] - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9] - m[8] * m[1] * m[7] + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9] + m[8] * m[1] * m[6] - m[8] * m[2] * m[5];

        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        (det, inv)
    }
}

pub fn al_identity_transform(trans: &mut Transform) {
    *trans = Transform::identity();
}

pub fn al_copy_transform(dest: &mut Transform, src: &Transform) {
    *dest = *src;
}

pub fn al_use_transform(trans: &Transform) {
    with_context(|ctx| ctx.transform = Some(*trans))
}

/// The current transform, identity until something else is used.
pub fn al_get_current_transform() -> Transform {
    with_context(|ctx| *ctx.transform.get_or_insert_with(Transform::identity))
}

/// Inverts in place by cofactor expansion. A singular matrix is left alone.
pub fn al_invert_transform(trans: &mut Transform) {
    let (det, adjugate) = trans.determinant_and_adjugate();
    if det.abs() < SINGULAR_EPSILON {
        return;
    }
    let inv_det = 1.0 / det;
    for (out, cofactor) in trans.m.iter_mut().zip(adjugate.iter()) {
        *out = cofactor * inv_det;
    }
}

/// 1 when `trans` can be inverted, 0 otherwise.
pub fn al_check_inverse(trans: &Transform) -> i32 {
    let (det, _) = trans.determinant_and_adjugate();
    (det.abs() >= SINGULAR_EPSILON) as i32
}

/// `trans = trans * other`, row by row.
pub fn al_compose_transform(trans: &mut Transform, other: &Transform) {
    let a = trans.m;
    let b = &other.m;
    for i in 0..4 {
        for j in 0..4 {
            trans.m[i * 4 + j] = (0..4).map(|k| a[i * 4 + k] * b[k * 4 + j]).sum();
        }
    }
}

pub fn al_transform_coordinates(trans: &Transform, x: &mut f32, y: &mut f32) {
    let m = &trans.m;
    let mut w = m[3] * *x + m[7] * *y + m[15];
    if w.abs() < SINGULAR_EPSILON {
        w = 1.0;
    }
    let tx = (m[0] * *x + m[4] * *y + m[12]) / w;
    let ty = (m[1] * *x + m[5] * *y + m[13]) / w;
    *x = tx;
    *y = ty;
}

pub fn al_translate_transform(trans: &mut Transform, x: f32, y: f32, z: f32) {
    let mut t = Transform::identity();
    t.m[12] = x;
    t.m[13] = y;
    t.m[14] = z;
    al_compose_transform(trans, &t);
}

pub fn al_translate_transform_3d(trans: &mut Transform, x: f32, y: f32, z: f32) {
    al_translate_transform(trans, x, y, z)
}

pub fn al_rotate_transform(trans: &mut Transform, theta: f32) {
    let (s, c) = theta.sin_cos();
    let mut t = Transform::identity();
    t.m[0] = c;
    t.m[1] = s;
    t.m[4] = -s;
    t.m[5] = c;
    al_compose_transform(trans, &t);
}

/// Rotation about an arbitrary axis. A zero-length axis does nothing.
pub fn al_rotate_transform_3d(trans: &mut Transform, x: f32, y: f32, z: f32, angle: f32) {
    let len = (x * x + y * y + z * z).sqrt();
    if len < SINGULAR_EPSILON {
        return;
    }
    let (x, y, z) = (x / len, y / len, z / len);
    let (s, c) = angle.sin_cos();
    let cc = 1.0 - c;

    let mut t = Transform::identity();
    t.m[0] = x * x * cc + c;
    t.m[1] = x * y * cc + z * s;
    t.m[2] = x * z * cc - y * s;
    t.m[4] = y * x * cc - z * s;
    t.m[5] = y * y * cc + c;
    t.m[6] = y * z * cc + x * s;
    t.m[8] = z * x * cc + y * s;
    t.m[9] = z * y * cc - x * s;
    t.m[10] = z * z * cc + c;
    al_compose_transform(trans, &t);
}

pub fn al_scale_transform(trans: &mut Transform, sx: f32, sy: f32, sz: f32) {
    let mut t = Transform::identity();
    t.m[0] = sx;
    t.m[5] = sy;
    t.m[10] = sz;
    al_compose_transform(trans, &t);
}

pub fn al_scale_transform_3d(trans: &mut Transform, sx: f32, sy: f32, sz: f32) {
    al_scale_transform(trans, sx, sy, sz)
}

pub fn al_translate_transform_f(trans: &mut Transform, x: f32, y: f32, z: f32) {
    al_translate_transform(trans, x, y, z)
}

/// Angle first, then the axis.
pub fn al_rotate_transform_f(trans: &mut Transform, angle: f32, x: f32, y: f32, z: f32) {
    al_rotate_transform_3d(trans, x, y, z, angle)
}

pub fn al_scale_transform_f(trans: &mut Transform, sx: f32, sy: f32, sz: f32) {
    al_scale_transform(trans, sx, sy, sz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Transform, b: &Transform) {
        for (x, y) in a.m.iter().zip(b.m.iter()) {
            assert!((x - y).abs() < 1e-4, "{:?} != {:?}", a.m, b.m);
        }
    }

    fn sample() -> Transform {
        let mut t = Transform::identity();
        al_scale_transform(&mut t, 2.0, 3.0, 1.0);
        al_rotate_transform(&mut t, 0.7);
        al_translate_transform(&mut t, 5.0, -4.0, 0.0);
        t
    }

    #[test]
    fn identity_composition_is_neutral() {
        let t = sample();
        let mut left = Transform::identity();
        al_compose_transform(&mut left, &t);
        assert_close(&left, &t);

        let mut right = t;
        al_compose_transform(&mut right, &Transform::identity());
        assert_close(&right, &t);
    }

    #[test]
    fn double_inversion_restores() {
        let t = sample();
        let mut inverted = t;
        al_invert_transform(&mut inverted);
        assert_eq!(al_check_inverse(&t), 1);

        let mut product = t;
        al_compose_transform(&mut product, &inverted);
        assert_close(&product, &Transform::identity());

        al_invert_transform(&mut inverted);
        assert_close(&inverted, &t);
    }

    #[test]
    fn singular_matrix_is_left_unchanged() {
        let mut zero = Transform { m: [0.0; 16] };
        al_invert_transform(&mut zero);
        assert_eq!(zero.m, [0.0; 16]);
        assert_eq!(al_check_inverse(&zero), 0);
    }

    #[test]
    fn scale_then_translate_maps_points() {
        let mut t = Transform::identity();
        al_scale_transform(&mut t, 2.0, 2.0, 1.0);
        al_translate_transform(&mut t, 10.0, 20.0, 0.0);

        let (mut x, mut y) = (1.0, 1.0);
        al_transform_coordinates(&t, &mut x, &mut y);
        assert_eq!((x, y), (12.0, 22.0));
    }

    #[test]
    fn zero_w_is_treated_as_one() {
        let mut t = Transform::identity();
        t.m[15] = 0.0;
        let (mut x, mut y) = (3.0, 4.0);
        al_transform_coordinates(&t, &mut x, &mut y);
        assert_eq!((x, y), (3.0, 4.0));
    }

    #[test]
    fn rotation_about_z_matches_2d_rotation() {
        let mut flat = Transform::identity();
        al_rotate_transform(&mut flat, 1.1);
        let mut axis = Transform::identity();
        al_rotate_transform_3d(&mut axis, 0.0, 0.0, 1.0, 1.1);
        assert_close(&flat, &axis);

        let mut unchanged = Transform::identity();
        al_rotate_transform_f(&mut unchanged, 1.1, 0.0, 0.0, 0.0);
        assert_eq!(unchanged, Transform::identity());
    }

    #[test]
    fn float_rotation_takes_angle_before_axis() {
        let mut flat = Transform::identity();
        al_rotate_transform(&mut flat, std::f32::consts::FRAC_PI_2);
        let mut axis = Transform::identity();
        al_rotate_transform_f(&mut axis, std::f32::consts::FRAC_PI_2, 0.0, 0.0, 1.0);
        assert_close(&flat, &axis);
        assert!((axis.m[1] - 1.0).abs() < 1e-4);
        assert!((axis.m[4] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn translate_and_scale_carry_depth() {
        let mut t = Transform::identity();
        al_scale_transform(&mut t, 2.0, 2.0, 4.0);
        al_translate_transform(&mut t, 1.0, 2.0, 3.0);
        assert_eq!((t.m[10], t.m[12], t.m[13], t.m[14]), (4.0, 1.0, 2.0, 3.0));

        let mut f = Transform::identity();
        al_scale_transform_f(&mut f, 2.0, 2.0, 4.0);
        al_translate_transform_f(&mut f, 1.0, 2.0, 3.0);
        assert_eq!(f, t);
    }

    #[test]
    fn current_transform_starts_as_identity() {
        assert_eq!(al_get_current_transform(), Transform::identity());
        let t = sample();
        al_use_transform(&t);
        assert_eq!(al_get_current_transform(), t);
    }
}
