//! Quaternion composer.
//!
//! Offsets are never added to rest Euler angles: Euler addition is not
//! rotation composition. The rest orientation stays a quaternion and the
//! offset's own quaternion is multiplied on the right.
//!
//! | delta | correction | result                    |
//! |-------|------------|---------------------------|
//! | no    | no         | `rest · E`                |
//! | no    | yes        | `rest · C · E · C⁻¹`      |
//! | yes   | no         | `E`                       |
//! | yes   | yes        | `C · E · C⁻¹`             |

use super::compiler::OffsetKeyframe;
use crate::math::{conjugate_by, euler_to_quat};
use glam::Quat;

/// Final orientation at one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseKeyframe {
    pub frame: u32,
    pub rotation: Quat,
}

/// Compose one rotation from an offset, an optional symmetry correction
/// and the rest rotation
#[inline]
pub fn compose_offset(offset: Quat, correction: Option<Quat>, rest: Quat, is_delta: bool) -> Quat {
    let corrected = match correction {
        Some(c) => conjugate_by(c, offset),
        None => offset,
    };
    if is_delta {
        corrected.normalize()
    } else {
        (rest * corrected).normalize()
    }
}

/// Compose every offset keyframe of one bone
pub fn compose(
    keyframes: &[OffsetKeyframe],
    correction: Option<Quat>,
    rest: Quat,
    is_delta: bool,
) -> Vec<PoseKeyframe> {
    keyframes
        .iter()
        .map(|kf| PoseKeyframe {
            frame: kf.frame,
            rotation: compose_offset(euler_to_quat(kf.offset), correction, rest, is_delta),
        })
        .collect()
}
