use crate::motion::keys::JOINT_NAMES;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Rig-independent identifier for each animated joint.
///
/// Motion data addresses joints by these names; the rig resolver maps them
/// to whatever bones a concrete skeleton exposes. Left/right members are
/// named from the character's own point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum LogicalJoint {
    // Torso
    Hips = 0,
    Spine = 1,
    Chest = 2,
    UpperChest = 3,
    Neck = 4,
    Head = 5,

    // Left arm chain
    LeftClavicle = 6,
    LeftShoulder = 7,
    LeftElbow = 8,
    LeftWrist = 9,

    // Right arm chain
    RightClavicle = 10,
    RightShoulder = 11,
    RightElbow = 12,
    RightWrist = 13,

    // Left leg chain
    LeftHip = 14,
    LeftKnee = 15,
    LeftAnkle = 16,
    LeftToe = 17,

    // Right leg chain
    RightHip = 18,
    RightKnee = 19,
    RightAnkle = 20,
    RightToe = 21,
}

impl LogicalJoint {
    /// Total number of logical joints
    pub const COUNT: usize = 22;

    /// Convert to array index
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const ALL: [LogicalJoint; Self::COUNT] = [
        LogicalJoint::Hips,
        LogicalJoint::Spine,
        LogicalJoint::Chest,
        LogicalJoint::UpperChest,
        LogicalJoint::Neck,
        LogicalJoint::Head,
        LogicalJoint::LeftClavicle,
        LogicalJoint::LeftShoulder,
        LogicalJoint::LeftElbow,
        LogicalJoint::LeftWrist,
        LogicalJoint::RightClavicle,
        LogicalJoint::RightShoulder,
        LogicalJoint::RightElbow,
        LogicalJoint::RightWrist,
        LogicalJoint::LeftHip,
        LogicalJoint::LeftKnee,
        LogicalJoint::LeftAnkle,
        LogicalJoint::LeftToe,
        LogicalJoint::RightHip,
        LogicalJoint::RightKnee,
        LogicalJoint::RightAnkle,
        LogicalJoint::RightToe,
    ];

    /// Name used in motion channel keys (`"leftKnee"` for `LeftKnee`)
    #[inline]
    pub fn name(self) -> &'static str {
        JOINT_NAMES[self.index()]
    }

    /// Look up a joint by its motion-data name
    pub fn from_name(name: &str) -> Option<LogicalJoint> {
        crate::motion::keys::joint_index(name).map(|i| Self::ALL[i])
    }
}

/// Mirrored limb pairs as `(right, left)`.
///
/// Symmetry corrections are computed for the right member of each pair.
pub const MIRRORED_PAIRS: [(LogicalJoint, LogicalJoint); 5] = [
    (LogicalJoint::RightHip, LogicalJoint::LeftHip),
    (LogicalJoint::RightKnee, LogicalJoint::LeftKnee),
    (LogicalJoint::RightAnkle, LogicalJoint::LeftAnkle),
    (LogicalJoint::RightShoulder, LogicalJoint::LeftShoulder),
    (LogicalJoint::RightElbow, LogicalJoint::LeftElbow),
];

const_assert!(LogicalJoint::COUNT <= 32);
const_assert!(LogicalJoint::COUNT == JOINT_NAMES.len());

/// Set of logical joints.
/// Uses a bitset where bit i corresponds to the joint with index i.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JointMask(u32);

impl JointMask {
    /// Create an empty set
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Create with every joint present
    #[inline]
    pub const fn all() -> Self {
        Self((1 << LogicalJoint::COUNT) - 1)
    }

    #[inline]
    pub fn contains(&self, joint: LogicalJoint) -> bool {
        (self.0 & (1 << joint.index())) != 0
    }

    /// Return new mask with `joint` added
    #[inline]
    pub fn with(self, joint: LogicalJoint) -> Self {
        Self(self.0 | (1 << joint.index()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterate contained joints in index order
    pub fn iter(self) -> impl Iterator<Item = LogicalJoint> {
        LogicalJoint::ALL
            .into_iter()
            .filter(move |joint| self.contains(*joint))
    }
}

impl FromIterator<LogicalJoint> for JointMask {
    fn from_iter<I: IntoIterator<Item = LogicalJoint>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), JointMask::with)
    }
}
