//! Channel-key grammar for authored motion data.
//!
//! This module is included by both the build script and the runtime motion
//! loader so bundled assets are validated with the same rules they are
//! parsed with. It must only depend on `std`.

// Some helpers are only used by build.rs
#![allow(dead_code)]

/// Logical joint names as they appear in motion data, in `LogicalJoint` order.
pub const JOINT_NAMES: [&str; 22] = [
    "hips",
    "spine",
    "chest",
    "upperChest",
    "neck",
    "head",
    "leftClavicle",
    "leftShoulder",
    "leftElbow",
    "leftWrist",
    "rightClavicle",
    "rightShoulder",
    "rightElbow",
    "rightWrist",
    "leftHip",
    "leftKnee",
    "leftAnkle",
    "leftToe",
    "rightHip",
    "rightKnee",
    "rightAnkle",
    "rightToe",
];

/// Rotation axis of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    fn from_suffix(c: char) -> Option<Axis> {
        match c {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Split a `"{jointName}{Axis}"` key, e.g. `"leftKneeX"` -> `("leftKnee", X)`.
///
/// The axis is the final uppercase `X`, `Y` or `Z`. The joint part is not
/// checked against [`JOINT_NAMES`]; see [`joint_index`].
pub fn split_channel_key(key: &str) -> Option<(&str, Axis)> {
    let last = key.chars().last()?;
    let axis = Axis::from_suffix(last)?;
    let joint = &key[..key.len() - last.len_utf8()];
    if joint.is_empty() {
        return None;
    }
    Some((joint, axis))
}

/// Position of a joint name in [`JOINT_NAMES`]
pub fn joint_index(name: &str) -> Option<usize> {
    JOINT_NAMES.iter().position(|n| *n == name)
}

/// Parse a keyframe time key such as `"0"`, `"0.25"` or `"1.5"`.
pub fn parse_time_key(key: &str) -> Option<f32> {
    let t: f32 = key.trim().parse().ok()?;
    t.is_finite().then_some(t)
}
