pub mod cache;
pub mod id;
pub mod rig;
pub mod symmetry;

pub use cache::*;
pub use id::*;
pub use rig::*;
pub use symmetry::*;

use crate::skeleton::{RigBone, SkeletonHost, WritePath};
use glam::Quat;

/// Everything the pipeline derives from one skeleton instance.
///
/// Created once after the skeleton loads and dropped with it. Functions
/// that need rest or correction data take it explicitly.
#[derive(Debug, Clone)]
pub struct RigBinding {
    pub rig: RigMap,
    pub rest: RestPoseCache,
    pub symmetry: SymmetryCorrection,
}

impl RigBinding {
    /// Resolve joints, capture rest poses and compute symmetry corrections.
    ///
    /// Returns `None` for unsupported rigs; the caller should skip motion
    /// playback for this skeleton.
    pub fn bind<S: SkeletonHost + ?Sized>(skeleton: &S, symmetry_tolerance: f32) -> Option<Self> {
        let rig = RigMap::resolve_all(skeleton);
        let Some(rest) = RestPoseCache::capture(skeleton, &rig) else {
            log::warn!(
                "Unsupported rig: no known joints among {} bones",
                skeleton.bone_count()
            );
            return None;
        };
        let symmetry = SymmetryCorrection::compute(&rig, &rest, symmetry_tolerance);

        Some(Self {
            rig,
            rest,
            symmetry,
        })
    }

    /// Rebuild rest poses and corrections from scratch
    pub fn recapture<S: SkeletonHost + ?Sized>(
        &mut self,
        skeleton: &S,
        symmetry_tolerance: f32,
    ) -> bool {
        match Self::bind(skeleton, symmetry_tolerance) {
            Some(binding) => {
                *self = binding;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn bone(&self, joint: LogicalJoint) -> Option<RigBone> {
        self.rig.bone(joint)
    }

    #[inline]
    pub fn rest_rotation(&self, bone: RigBone) -> Quat {
        self.rest.rotation(bone)
    }

    #[inline]
    pub fn write_path(&self, bone: RigBone) -> WritePath {
        self.rest.write_path(bone)
    }
}
