//! Rotation helpers shared by the whole motion pipeline.
//!
//! Offsets are authored as Euler angles but every composition happens on
//! quaternions. Euler components are packed into a `Vec3` as
//! `(pitch, yaw, roll)` = `(x, y, z)`, always in radians once they leave the
//! motion compiler.

pub use glam::{EulerRot, Quat, Vec3};

/// Small epsilon value for floating-point comparisons
pub const EPSILON: f32 = 1e-6;

/// Convert an `(x=pitch, y=yaw, z=roll)` offset in radians to a quaternion.
///
/// Axis composition is fixed: yaw about Y, then pitch about X, then roll
/// about Z (`Ry * Rx * Rz`).
#[inline]
pub fn euler_to_quat(offset: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, offset.y, offset.x, offset.z)
}

/// Same as [`euler_to_quat`] but takes degrees.
#[inline]
pub fn euler_degrees_to_quat(offset_degrees: Vec3) -> Quat {
    euler_to_quat(degrees_to_radians(offset_degrees))
}

#[inline]
pub fn degrees_to_radians(v: Vec3) -> Vec3 {
    Vec3::new(v.x.to_radians(), v.y.to_radians(), v.z.to_radians())
}

/// Reflect an orientation across the sagittal (YZ) plane.
///
/// Negating the Y and Z vector components maps a left-side bone orientation
/// onto its right-side counterpart.
#[inline]
pub fn mirror_sagittal(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.y, -q.z, q.w)
}

/// True when `q` is within `tolerance` of the identity rotation.
///
/// Compares the scalar part only; `q` and `-q` are treated alike.
#[inline]
pub fn is_near_identity(q: Quat, tolerance: f32) -> bool {
    (1.0 - q.w.abs()) <= tolerance
}

/// Conjugation sandwich `c * q * c⁻¹`: expresses `q` in the frame of `c`.
#[inline]
pub fn conjugate_by(c: Quat, q: Quat) -> Quat {
    c * q * c.inverse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_euler_yaw_only_matches_rotation_y() {
        let q = euler_to_quat(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert!(q.abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-6));
    }

    #[test]
    fn test_euler_order_is_yaw_pitch_roll() {
        let offset = Vec3::new(0.3, 0.7, -0.2);
        let expected = Quat::from_rotation_y(offset.y)
            * Quat::from_rotation_x(offset.x)
            * Quat::from_rotation_z(offset.z);
        assert!(euler_to_quat(offset).abs_diff_eq(expected, 1e-5));

        // A different order must not coincide for this offset
        let wrong = Quat::from_rotation_x(offset.x)
            * Quat::from_rotation_y(offset.y)
            * Quat::from_rotation_z(offset.z);
        assert!(!euler_to_quat(offset).abs_diff_eq(wrong, 1e-3));
    }

    #[test]
    fn test_mirror_is_involution() {
        let q = Quat::from_euler(EulerRot::XYZ, 0.4, -1.1, 0.25);
        assert!(mirror_sagittal(mirror_sagittal(q)).abs_diff_eq(q, 1e-7));
    }

    #[test]
    fn test_mirror_flips_yaw_direction() {
        let yaw = Quat::from_rotation_y(0.5);
        let mirrored = mirror_sagittal(yaw);
        assert!(mirrored.abs_diff_eq(Quat::from_rotation_y(-0.5), 1e-6));

        // Pitch about X lies in the mirror plane's normal and is kept
        let pitch = Quat::from_rotation_x(0.5);
        assert!(mirror_sagittal(pitch).abs_diff_eq(pitch, 1e-6));
    }

    #[test]
    fn test_near_identity_ignores_sign() {
        assert!(is_near_identity(Quat::IDENTITY, 1e-4));
        assert!(is_near_identity(-Quat::IDENTITY, 1e-4));
        assert!(!is_near_identity(Quat::from_rotation_z(0.1), 1e-4));
    }

    #[test]
    fn test_conjugate_of_identity_is_identity() {
        let c = Quat::from_rotation_x(1.0);
        assert!(conjugate_by(c, Quat::IDENTITY).abs_diff_eq(Quat::IDENTITY, 1e-6));
    }
}
