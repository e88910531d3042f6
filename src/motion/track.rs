use super::compiler::compile;
use super::compose::{compose, PoseKeyframe};
use super::definition::MotionDefinition;
use crate::bone::RigBinding;
use crate::skeleton::RigBone;
use glam::Quat;

/// Whether a track carries full orientations or additive offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Orientation includes the rest pose
    Absolute,
    /// Orientation excludes the rest pose; layered on a base
    Delta,
}

/// Composed keyframes of one bone, sorted by frame
#[derive(Debug, Clone)]
pub struct BoneTrack {
    pub bone: RigBone,
    pub keyframes: Vec<PoseKeyframe>,
}

impl BoneTrack {
    /// Sample at a fractional frame, using slerp interpolation.
    /// Clamps before the first and after the last keyframe.
    pub fn sample(&self, frame: f32) -> Quat {
        let Some(first) = self.keyframes.first() else {
            return Quat::IDENTITY;
        };

        // Binary search for keyframe (using partition_point for efficiency)
        let next_idx = self
            .keyframes
            .partition_point(|kf| kf.frame as f32 <= frame);

        if next_idx == 0 {
            return first.rotation;
        }
        if next_idx >= self.keyframes.len() {
            return self.keyframes[self.keyframes.len() - 1].rotation;
        }

        let prev = &self.keyframes[next_idx - 1];
        if frame == prev.frame as f32 {
            return prev.rotation;
        }
        let next = &self.keyframes[next_idx];
        let span = (next.frame - prev.frame) as f32;
        let t = if span > 0.0 {
            (frame - prev.frame as f32) / span
        } else {
            0.0
        };

        prev.rotation.slerp(next.rotation, t)
    }
}

/// A motion compiled against one skeleton's rest pose and corrections
#[derive(Debug, Clone)]
pub struct CompiledPoseTrack {
    pub name: String,
    pub kind: TrackKind,
    pub fps: f32,
    pub duration: f32,
    pub looping: bool,
    pub bones: Vec<BoneTrack>,
}

impl CompiledPoseTrack {
    /// Compile and compose `def` for the skeleton behind `binding`
    pub fn build(def: &MotionDefinition, binding: &RigBinding, fps: f32) -> Self {
        let kind = if def.is_delta {
            TrackKind::Delta
        } else {
            TrackKind::Absolute
        };

        let bones = compile(def, &binding.rig, fps)
            .into_iter()
            .map(|offsets| {
                let mut keyframes = compose(
                    &offsets.keyframes,
                    binding.symmetry.get(offsets.bone),
                    binding.rest.rotation(offsets.bone),
                    def.is_delta,
                );
                // Distinct times can round onto one frame; keep the last
                keyframes.dedup_by(|later, earlier| {
                    if later.frame == earlier.frame {
                        earlier.rotation = later.rotation;
                        true
                    } else {
                        false
                    }
                });
                BoneTrack {
                    bone: offsets.bone,
                    keyframes,
                }
            })
            .collect();

        Self {
            name: def.name.clone(),
            kind,
            fps,
            duration: def.duration,
            looping: def.looping,
            bones,
        }
    }

    #[inline]
    pub fn is_delta(&self) -> bool {
        self.kind == TrackKind::Delta
    }

    pub fn bone(&self, bone: RigBone) -> Option<&BoneTrack> {
        self.bones.iter().find(|t| t.bone == bone)
    }
}
