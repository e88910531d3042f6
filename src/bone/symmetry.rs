//! Left/right symmetry correction.
//!
//! Rigs are rarely bound perfectly mirrored. For each mirrored pair the
//! right bone gets a correction `C = R⁻¹ · mirror(L)` that maps the right
//! rest frame onto the reflected left rest frame. Authored offsets are then
//! applied as `C · offset · C⁻¹`: a zero offset still reproduces the exact
//! rest pose, and equal offsets rotate both limbs by the same amount.

use super::cache::RestPoseCache;
use super::id::MIRRORED_PAIRS;
use super::rig::RigMap;
use crate::math::{conjugate_by, is_near_identity, mirror_sagittal};
use crate::skeleton::RigBone;
use glam::Quat;
use std::collections::BTreeMap;

/// Default tolerance on `1 - |w|` below which a correction is dropped
pub const SYMMETRY_TOLERANCE: f32 = 1e-4;

/// Per-bone symmetry corrections, keyed by the right-side bone.
/// A missing entry means identity.
#[derive(Debug, Clone, Default)]
pub struct SymmetryCorrection {
    corrections: BTreeMap<RigBone, Quat>,
}

impl SymmetryCorrection {
    /// Compute corrections for every mirrored pair whose sides both resolved
    pub fn compute(rig: &RigMap, rest: &RestPoseCache, tolerance: f32) -> Self {
        let mut corrections = BTreeMap::new();

        for (right_joint, left_joint) in MIRRORED_PAIRS {
            let (Some(right), Some(left)) = (rig.bone(right_joint), rig.bone(left_joint)) else {
                continue;
            };
            let (Some(right_rest), Some(left_rest)) = (rest.get(right), rest.get(left)) else {
                continue;
            };

            let correction =
                (right_rest.rotation.inverse() * mirror_sagittal(left_rest.rotation)).normalize();
            if is_near_identity(correction, tolerance) {
                continue;
            }
            log::debug!(
                "Symmetry correction for {}: {:?}",
                right_joint.name(),
                correction
            );
            corrections.insert(right, correction);
        }

        Self { corrections }
    }

    #[inline]
    pub fn get(&self, bone: RigBone) -> Option<Quat> {
        self.corrections.get(&bone).copied()
    }

    /// Express `offset` in the corrected frame of `bone`
    pub fn apply(&self, bone: RigBone, offset: Quat) -> Quat {
        match self.get(bone) {
            Some(c) => conjugate_by(c, offset),
            None => offset,
        }
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }
}
