//! Root position offsets and the jump trajectory.

use super::definition::{JumpPhysics, PositionKeyframe};
use glam::Vec3;

/// Interpolate the root offset at `time`.
///
/// Returns `None` when the motion carries no position keyframes. X and Z
/// are always linear; Y is linear unless `jump` overrides it.
pub fn interpolate_position(
    keyframes: &[PositionKeyframe],
    time: f32,
    jump: Option<&JumpPhysics>,
) -> Option<Vec3> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;

    let mut position = if time <= first.time {
        first.position
    } else if time >= last.time {
        last.position
    } else {
        let next_idx = keyframes.partition_point(|kf| kf.time <= time);
        let prev = &keyframes[next_idx - 1];
        let next = &keyframes[next_idx];
        let span = next.time - prev.time;
        let t = if span > 0.0 {
            (time - prev.time) / span
        } else {
            0.0
        };
        prev.position.lerp(next.position, t)
    };

    if let Some(jump) = jump {
        position.y = jump_height(jump, time);
    }
    Some(position)
}

/// Height of the two-phase parabolic jump at `time`.
///
/// Ascent follows `h(2p - p²)` and descent `h(1 - p²)`, so vertical speed
/// is zero at the apex. The apex is held for `hang_time`. When the peak is
/// not after liftoff the jump starts at the apex.
pub fn jump_height(jump: &JumpPhysics, time: f32) -> f32 {
    let h = jump.peak_height;
    if time < jump.liftoff_time || time >= jump.landing_time {
        return 0.0;
    }

    let ascending = jump.peak_time > jump.liftoff_time;
    if ascending && time < jump.peak_time {
        let p = (time - jump.liftoff_time) / (jump.peak_time - jump.liftoff_time);
        return h * (2.0 * p - p * p);
    }

    let apex = jump.peak_time.max(jump.liftoff_time);
    let descent_start = (apex + jump.hang_time).min(jump.landing_time);
    if time < descent_start {
        return h;
    }

    let span = jump.landing_time - descent_start;
    if span <= 0.0 {
        return 0.0;
    }
    let p = (time - descent_start) / span;
    h * (1.0 - p * p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jump(liftoff: f32, peak: f32, landing: f32, height: f32, hang: f32) -> JumpPhysics {
        JumpPhysics {
            liftoff_time: liftoff,
            peak_time: peak,
            landing_time: landing,
            peak_height: height,
            hang_time: hang,
        }
    }

    fn kf(time: f32, x: f32, y: f32, z: f32) -> PositionKeyframe {
        PositionKeyframe {
            time,
            position: Vec3::new(x, y, z),
        }
    }

    #[test]
    fn test_no_keyframes_is_none() {
        assert_eq!(interpolate_position(&[], 0.5, None), None);
    }

    #[test]
    fn test_linear_and_clamped() {
        let keys = [kf(0.0, 0.0, 0.0, 0.0), kf(1.0, 2.0, 1.0, -4.0)];
        let mid = interpolate_position(&keys, 0.25, None).unwrap();
        assert!(mid.abs_diff_eq(Vec3::new(0.5, 0.25, -1.0), 1e-6));
        assert_eq!(interpolate_position(&keys, -1.0, None), Some(keys[0].position));
        assert_eq!(interpolate_position(&keys, 5.0, None), Some(keys[1].position));
    }

    #[test]
    fn test_jump_parabola_shape() {
        let j = jump(0.0, 0.5, 1.0, 1.2, 0.0);
        assert_eq!(jump_height(&j, 0.0), 0.0);
        assert!((jump_height(&j, 0.5) - 1.2).abs() < 1e-6);
        assert_eq!(jump_height(&j, 1.0), 0.0);

        let samples: Vec<f32> = (0..=100).map(|i| jump_height(&j, i as f32 / 100.0)).collect();
        for w in samples[..=50].windows(2) {
            assert!(w[1] >= w[0], "ascent not monotonic: {w:?}");
        }
        for w in samples[50..100].windows(2) {
            assert!(w[1] <= w[0], "descent not monotonic: {w:?}");
        }
    }

    #[test]
    fn test_jump_overrides_only_y() {
        let keys = [kf(0.0, 0.0, 5.0, 0.0), kf(1.0, 0.0, 5.0, 2.0)];
        let j = jump(0.0, 0.5, 1.0, 1.2, 0.0);
        let p = interpolate_position(&keys, 0.5, Some(&j)).unwrap();
        assert!((p.y - 1.2).abs() < 1e-6);
        assert!((p.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hang_holds_apex() {
        let j = jump(0.2, 0.5, 1.2, 1.0, 0.3);
        assert_eq!(jump_height(&j, 0.1), 0.0);
        assert!((jump_height(&j, 0.6) - 1.0).abs() < 1e-6);
        assert!((jump_height(&j, 0.79) - 1.0).abs() < 1e-6);
        assert!(jump_height(&j, 1.0) < 1.0);
    }

    #[test]
    fn test_descent_only_jump() {
        // Peak not after liftoff: starts at apex, holds through the hang
        let j = jump(0.4, 0.4, 1.0, 0.8, 0.2);
        assert!((jump_height(&j, 0.4) - 0.8).abs() < 1e-6);
        assert!((jump_height(&j, 0.5) - 0.8).abs() < 1e-6);
        assert!((jump_height(&j, 0.6) - 0.8).abs() < 1e-6);
        assert!(jump_height(&j, 0.9) < 0.8);
        assert_eq!(jump_height(&j, 1.0), 0.0);
    }
}
