//! Motion player: evaluate compiled tracks at a playback time.
//!
//! Evaluation is a pure function of the track and the time. The controller
//! owns every piece of mutable playback state.

use super::track::CompiledPoseTrack;
use crate::bone::RestPoseCache;
use crate::skeleton::RigBone;
use glam::Quat;
use std::collections::BTreeMap;

/// Evaluated orientation per bone
pub type PoseMap = BTreeMap<RigBone, Quat>;

/// Map a running playback time onto `[0, duration]`.
///
/// Looping tracks wrap modulo `duration`; others clamp at the end.
#[inline]
pub fn wrap_time(time: f32, duration: f32, looping: bool) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    if looping {
        time.rem_euclid(duration)
    } else {
        time.clamp(0.0, duration)
    }
}

/// Evaluate every bone of `track` at `time` seconds
pub fn evaluate(track: &CompiledPoseTrack, time: f32) -> PoseMap {
    let frame = wrap_time(time, track.duration, track.looping) * track.fps;
    track
        .bones
        .iter()
        .map(|bone| (bone.bone, bone.sample(frame)))
        .collect()
}

/// Evaluate a delta track layered on a base.
///
/// `base` is the base track with its own playback time. Each bone gets
/// `base × delta`; bones the base does not drive ride on the rest pose.
pub fn evaluate_layered(
    base: Option<(&CompiledPoseTrack, f32)>,
    delta: &CompiledPoseTrack,
    time: f32,
    rest: &RestPoseCache,
) -> PoseMap {
    let mut pose = match base {
        Some((track, base_time)) => evaluate(track, base_time),
        None => PoseMap::new(),
    };

    for (bone, delta_rotation) in evaluate(delta, time) {
        let under = pose
            .get(&bone)
            .copied()
            .unwrap_or_else(|| rest.rotation(bone));
        pose.insert(bone, (under * delta_rotation).normalize());
    }
    pose
}

/// Blend from a snapshot of previous orientations toward `target`.
///
/// Bones missing from the snapshot take the target value directly.
pub fn evaluate_blended(snapshot: &PoseMap, target: &PoseMap, ratio: f32) -> PoseMap {
    let ratio = ratio.clamp(0.0, 1.0);
    target
        .iter()
        .map(|(bone, to)| {
            let rotation = match snapshot.get(bone) {
                Some(from) => from.slerp(*to, ratio),
                None => *to,
            };
            (*bone, rotation)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::compose::PoseKeyframe;
    use crate::motion::track::{BoneTrack, TrackKind};
    use std::f32::consts::FRAC_PI_2;

    fn single_bone(kind: TrackKind, looping: bool, keys: &[(u32, Quat)]) -> CompiledPoseTrack {
        CompiledPoseTrack {
            name: "t".to_string(),
            kind,
            fps: 30.0,
            duration: 3.0,
            looping,
            bones: vec![BoneTrack {
                bone: RigBone(0),
                keyframes: keys
                    .iter()
                    .map(|&(frame, rotation)| PoseKeyframe { frame, rotation })
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_wrap_time() {
        assert!((wrap_time(3.1, 3.0, true) - 0.1).abs() < 1e-5);
        assert_eq!(wrap_time(3.1, 3.0, false), 3.0);
        assert_eq!(wrap_time(-1.0, 3.0, false), 0.0);
        assert_eq!(wrap_time(1.0, 0.0, true), 0.0);
    }

    #[test]
    fn test_looping_wraps_past_duration() {
        let track = single_bone(
            TrackKind::Absolute,
            true,
            &[
                (0, Quat::IDENTITY),
                (45, Quat::from_rotation_x(1.0)),
                (90, Quat::IDENTITY),
            ],
        );
        let late = evaluate(&track, 3.1)[&RigBone(0)];
        let early = evaluate(&track, 0.1)[&RigBone(0)];
        assert!(late.abs_diff_eq(early, 1e-4));
    }

    #[test]
    fn test_non_looping_clamps_at_end() {
        let end = Quat::from_rotation_z(0.8);
        let track = single_bone(TrackKind::Absolute, false, &[(0, Quat::IDENTITY), (90, end)]);
        assert!(evaluate(&track, 10.0)[&RigBone(0)].abs_diff_eq(end, 1e-6));
    }

    #[test]
    fn test_layered_is_base_times_delta() {
        let base_q = Quat::from_rotation_x(FRAC_PI_2);
        let delta_q = Quat::from_rotation_y(FRAC_PI_2);
        let base = single_bone(TrackKind::Absolute, true, &[(0, base_q), (90, base_q)]);
        let delta = single_bone(TrackKind::Delta, true, &[(0, delta_q), (90, delta_q)]);

        let pose = evaluate_layered(Some((&base, 1.0)), &delta, 1.0, &RestPoseCache::default());
        let layered = pose[&RigBone(0)];
        assert!(layered.abs_diff_eq(base_q * delta_q, 1e-6));
        // Order matters
        assert!(!layered.abs_diff_eq(delta_q * base_q, 1e-3));
    }

    #[test]
    fn test_layered_without_base_rides_on_rest() {
        let delta_q = Quat::from_rotation_y(0.4);
        let delta = single_bone(TrackKind::Delta, true, &[(0, delta_q)]);
        let rest = RestPoseCache::from_rotations([(RigBone(0), Quat::from_rotation_x(0.7))]);

        let pose = evaluate_layered(None, &delta, 0.5, &rest);
        assert!(pose[&RigBone(0)].abs_diff_eq(Quat::from_rotation_x(0.7) * delta_q, 1e-6));
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let from = Quat::IDENTITY;
        let to = Quat::from_rotation_x(FRAC_PI_2);
        let snapshot = PoseMap::from([(RigBone(0), from)]);
        let target = PoseMap::from([(RigBone(0), to), (RigBone(1), to)]);

        assert!(evaluate_blended(&snapshot, &target, 0.0)[&RigBone(0)].abs_diff_eq(from, 1e-6));
        assert!(evaluate_blended(&snapshot, &target, 1.0)[&RigBone(0)].abs_diff_eq(to, 1e-6));
        let mid = evaluate_blended(&snapshot, &target, 0.5);
        assert!(mid[&RigBone(0)].abs_diff_eq(Quat::from_rotation_x(FRAC_PI_2 / 2.0), 1e-5));
        // Not in the snapshot: snaps to target
        assert_eq!(mid[&RigBone(1)], to);
    }
}
