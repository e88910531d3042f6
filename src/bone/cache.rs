use super::rig::RigMap;
use crate::math::euler_degrees_to_quat;
use crate::skeleton::{RigBone, SkeletonHost, WritePath};
use glam::Quat;
use std::collections::BTreeMap;

/// Cached rest data for one bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestEntry {
    /// Bind rotation with any static rig correction already applied
    pub rotation: Quat,
    /// Write path, resolved once at capture time
    pub write_path: WritePath,
}

/// Rest (bind) pose of every resolved bone.
///
/// Captured once after the skeleton loads and before any pose is written.
/// Entries never change afterwards except through a full re-capture.
#[derive(Debug, Clone, Default)]
pub struct RestPoseCache {
    entries: BTreeMap<RigBone, RestEntry>,
}

impl RestPoseCache {
    /// Capture rest rotations for all bones in `rig`.
    ///
    /// Reads the bone's bind rotation, never its current rotation (which
    /// playback overwrites every frame). Returns `None` when no joint
    /// resolved at all.
    pub fn capture<S: SkeletonHost + ?Sized>(skeleton: &S, rig: &RigMap) -> Option<Self> {
        if rig.resolved().is_empty() {
            return None;
        }

        let corrections = rig.convention().rest_corrections();
        let entries = rig
            .iter()
            .map(|(joint, bone)| {
                let mut rotation = skeleton.bind_rotation(bone);
                if let Some((_, degrees)) = corrections.iter().find(|(j, _)| *j == joint) {
                    rotation *= euler_degrees_to_quat(*degrees);
                }
                let entry = RestEntry {
                    rotation: rotation.normalize(),
                    write_path: skeleton.write_path(bone),
                };
                (bone, entry)
            })
            .collect();

        Some(Self { entries })
    }

    #[inline]
    pub fn get(&self, bone: RigBone) -> Option<&RestEntry> {
        self.entries.get(&bone)
    }

    /// Cached rest rotation, identity when the bone was never captured
    #[inline]
    pub fn rotation(&self, bone: RigBone) -> Quat {
        self.entries
            .get(&bone)
            .map_or(Quat::IDENTITY, |entry| entry.rotation)
    }

    pub fn write_path(&self, bone: RigBone) -> WritePath {
        self.entries
            .get(&bone)
            .map_or(WritePath::Direct, |entry| entry.write_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RigBone, &RestEntry)> + '_ {
        self.entries.iter().map(|(bone, entry)| (*bone, entry))
    }

    #[cfg(test)]
    pub(crate) fn from_rotations<I: IntoIterator<Item = (RigBone, Quat)>>(rotations: I) -> Self {
        Self {
            entries: rotations
                .into_iter()
                .map(|(bone, rotation)| {
                    let entry = RestEntry {
                        rotation,
                        write_path: WritePath::Direct,
                    };
                    (bone, entry)
                })
                .collect(),
        }
    }
}
