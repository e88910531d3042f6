//! Motion compiler: sparse authored channels -> dense per-bone offsets.
//!
//! No interpolation happens here. Each joint gets one keyframe per distinct
//! authored time across its three axes; interpolation is left to the player.

use super::definition::{axis_value, MotionDefinition};
use super::keys::Axis;
use crate::bone::{JointMask, LogicalJoint, RigConvention, RigMap};
use crate::math::degrees_to_radians;
use crate::skeleton::RigBone;
use glam::Vec3;

/// Pure rotational offset at one frame, Euler radians `(pitch, yaw, roll)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetKeyframe {
    pub frame: u32,
    pub offset: Vec3,
}

/// Offset keyframes for one resolved bone
#[derive(Debug, Clone, PartialEq)]
pub struct BoneOffsets {
    pub joint: LogicalJoint,
    pub bone: RigBone,
    pub keyframes: Vec<OffsetKeyframe>,
}

/// Convert a time in seconds to a frame number
#[inline]
pub fn time_to_frame(time: f32, fps: f32) -> u32 {
    (time * fps).round().max(0.0) as u32
}

/// Compile `def` against a resolved rig.
///
/// Every resolved joint appears exactly once in the output. Joints the
/// motion does not touch get an all-zero two-frame track (hold rest pose);
/// joints with only a static adjustment get a constant two-frame track.
/// Static adjustments apply to deform-convention rigs only.
pub fn compile(def: &MotionDefinition, rig: &RigMap, fps: f32) -> Vec<BoneOffsets> {
    let deform = rig.convention() == RigConvention::Deform;
    let end_frame = time_to_frame(def.duration, fps);
    let adjustment = |joint: LogicalJoint| {
        if deform {
            def.adjustment(joint).unwrap_or(Vec3::ZERO)
        } else {
            Vec3::ZERO
        }
    };
    let constant = |offset: Vec3| {
        vec![
            OffsetKeyframe { frame: 0, offset },
            OffsetKeyframe {
                frame: end_frame,
                offset,
            },
        ]
    };

    let grouped = def.joint_channels();
    let mut out = Vec::with_capacity(LogicalJoint::COUNT);
    let mut touched = JointMask::empty();

    for (joint, channels) in &grouped {
        let Some(bone) = rig.bone(*joint) else {
            continue;
        };
        touched = touched.with(*joint);

        let mut times: Vec<f32> = channels
            .iter()
            .flatten()
            .flat_map(|c| c.keys.iter().map(|(t, _)| *t))
            .collect();
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup();

        let extra = adjustment(*joint);
        let keyframes = times
            .into_iter()
            .map(|time| {
                let degrees = Vec3::new(
                    axis_value(channels, Axis::X, time),
                    axis_value(channels, Axis::Y, time),
                    axis_value(channels, Axis::Z, time),
                ) + extra;
                OffsetKeyframe {
                    frame: time_to_frame(time, fps),
                    offset: degrees_to_radians(degrees),
                }
            })
            .collect();

        out.push(BoneOffsets {
            joint: *joint,
            bone,
            keyframes,
        });
    }

    for (joint, bone) in rig.iter() {
        if touched.contains(joint) {
            continue;
        }
        let offset = degrees_to_radians(adjustment(joint));
        out.push(BoneOffsets {
            joint,
            bone,
            keyframes: constant(offset),
        });
    }

    out.sort_by_key(|b| b.joint);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::rig::tests::{deform_skeleton, prefixed_skeleton};
    use crate::skeleton::Skeleton;
    use glam::Quat;

    const FPS: f32 = 30.0;

    fn motion(json: &str) -> MotionDefinition {
        MotionDefinition::from_json(json).unwrap()
    }

    fn find(out: &[BoneOffsets], joint: LogicalJoint) -> &BoneOffsets {
        out.iter().find(|b| b.joint == joint).unwrap()
    }

    #[test]
    fn test_ragged_axes_are_unioned() {
        let def = motion(
            r#"{
            "name": "reach", "duration": 1.0,
            "keyframes": {
                "leftShoulderX": { "0": 10, "1.0": 20 },
                "leftShoulderZ": { "0.5": 90 }
            }
        }"#,
        );
        let rig = RigMap::resolve_all(&prefixed_skeleton());
        let out = compile(&def, &rig, FPS);

        let shoulder = find(&out, LogicalJoint::LeftShoulder);
        let frames: Vec<u32> = shoulder.keyframes.iter().map(|k| k.frame).collect();
        assert_eq!(frames, vec![0, 15, 30]);

        // Missing axis/time reads as zero, no interpolation
        let mid = shoulder.keyframes[1].offset;
        assert_eq!(mid.x, 0.0);
        assert!((mid.z - 90f32.to_radians()).abs() < 1e-6);
        assert!((shoulder.keyframes[2].offset.x - 20f32.to_radians()).abs() < 1e-6);
        assert_eq!(shoulder.keyframes[2].offset.z, 0.0);
    }

    #[test]
    fn test_untouched_bones_hold_rest() {
        let def = motion(r#"{ "name": "nod", "duration": 2.0, "keyframes": { "headX": { "1.0": 15 } } }"#);
        let rig = RigMap::resolve_all(&prefixed_skeleton());
        let out = compile(&def, &rig, FPS);

        assert_eq!(out.len(), LogicalJoint::COUNT);
        let hips = find(&out, LogicalJoint::Hips);
        assert_eq!(
            hips.keyframes,
            vec![
                OffsetKeyframe { frame: 0, offset: Vec3::ZERO },
                OffsetKeyframe { frame: 60, offset: Vec3::ZERO },
            ]
        );
        assert_eq!(find(&out, LogicalJoint::Head).keyframes.len(), 1);
    }

    #[test]
    fn test_adjustments_only_on_deform_rigs() {
        let json = r#"{
            "name": "stance", "duration": 1.0,
            "keyframes": { "leftKneeX": { "0": 30 } },
            "rigifyAdjustments": { "leftKnee": { "x": 5 }, "rightKnee": { "z": -10 } }
        }"#;
        let def = motion(json);

        let deform = compile(&def, &RigMap::resolve_all(&deform_skeleton()), FPS);
        let left = find(&deform, LogicalJoint::LeftKnee);
        assert!((left.keyframes[0].offset.x - 35f32.to_radians()).abs() < 1e-6);
        // Adjustment-only joint: constant two-frame track
        let right = find(&deform, LogicalJoint::RightKnee);
        assert_eq!(right.keyframes.len(), 2);
        assert!((right.keyframes[0].offset.z + 10f32.to_radians()).abs() < 1e-6);
        assert_eq!(right.keyframes[0].offset, right.keyframes[1].offset);

        let prefixed = compile(&def, &RigMap::resolve_all(&prefixed_skeleton()), FPS);
        let left = find(&prefixed, LogicalJoint::LeftKnee);
        assert!((left.keyframes[0].offset.x - 30f32.to_radians()).abs() < 1e-6);
        assert_eq!(
            find(&prefixed, LogicalJoint::RightKnee).keyframes[0].offset,
            Vec3::ZERO
        );
    }

    #[test]
    fn test_unresolved_joints_are_skipped() {
        let skeleton = Skeleton::from_bind_pose([("mixamorig:Hips", Quat::IDENTITY)]);
        let def = motion(r#"{ "name": "x", "duration": 1.0, "keyframes": { "headY": { "0": 15 } } }"#);
        let out = compile(&def, &RigMap::resolve_all(&skeleton), FPS);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].joint, LogicalJoint::Hips);
    }

    #[test]
    fn test_frame_rounding() {
        assert_eq!(time_to_frame(0.0, 30.0), 0);
        assert_eq!(time_to_frame(0.51, 30.0), 15);
        assert_eq!(time_to_frame(0.52, 30.0), 16);
        assert_eq!(time_to_frame(1.0, 60.0), 60);
    }
}
