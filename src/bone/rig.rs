//! Logical joint -> concrete bone resolution.
//!
//! Two skeleton naming conventions are supported:
//!
//! - **Prefixed** (`mixamorig:LeftArm`): flat names behind an exporter
//!   prefix. The prefix varies (`mixamorig1:`, `mixamorig`), so matching
//!   falls back from exact to prefix-stripped to case-insensitive substring.
//! - **Deform** (`DEF-upper_arm.L`): deform bones with generational
//!   suffixes (`DEF-spine`, `DEF-spine.001`, ...). Matching is exact or
//!   delimiter-separated; a `.` after the pattern means another generation
//!   and is rejected.
//!
//! The convention is detected once per skeleton and stored in [`RigMap`].

use super::id::{JointMask, LogicalJoint};
use crate::skeleton::{RigBone, SkeletonHost};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Substring marking a prefixed-convention skeleton
pub const PREFIXED_MARKER: &str = "mixamorig";

/// Name prefix marking a deform-convention skeleton
pub const DEFORM_MARKER: &str = "DEF-";

/// Skeleton naming convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RigConvention {
    Prefixed,
    Deform,
}

impl RigConvention {
    /// Detect the convention from a skeleton's bone names.
    ///
    /// Unknown rigs are treated as [`RigConvention::Prefixed`], whose
    /// substring fallback is the most forgiving.
    pub fn detect<S: SkeletonHost + ?Sized>(skeleton: &S) -> RigConvention {
        let mut deform = false;
        for bone in skeleton.bones() {
            let name = skeleton.bone_name(bone);
            if name.contains(PREFIXED_MARKER) {
                return RigConvention::Prefixed;
            }
            deform |= name.starts_with(DEFORM_MARKER);
        }
        if deform {
            RigConvention::Deform
        } else {
            RigConvention::Prefixed
        }
    }

    /// Bone name pattern for a joint under this convention
    pub fn pattern(self, joint: LogicalJoint) -> &'static str {
        match self {
            RigConvention::Prefixed => PREFIXED_NAMES[joint.index()],
            RigConvention::Deform => DEFORM_NAMES[joint.index()],
        }
    }

    /// Static bind-pose corrections baked into the rest pose cache,
    /// as `(joint, euler degrees)`
    pub fn rest_corrections(self) -> &'static [(LogicalJoint, Vec3)] {
        match self {
            RigConvention::Prefixed => &[],
            RigConvention::Deform => DEFORM_REST_CORRECTIONS,
        }
    }
}

/// Prefixed-convention names, in `LogicalJoint` order (prefix omitted)
const PREFIXED_NAMES: [&str; LogicalJoint::COUNT] = [
    "Hips",
    "Spine",
    "Spine1",
    "Spine2",
    "Neck",
    "Head",
    "LeftShoulder",
    "LeftArm",
    "LeftForeArm",
    "LeftHand",
    "RightShoulder",
    "RightArm",
    "RightForeArm",
    "RightHand",
    "LeftUpLeg",
    "LeftLeg",
    "LeftFoot",
    "LeftToeBase",
    "RightUpLeg",
    "RightLeg",
    "RightFoot",
    "RightToeBase",
];

/// Deform-convention names, in `LogicalJoint` order
const DEFORM_NAMES: [&str; LogicalJoint::COUNT] = [
    "DEF-spine",
    "DEF-spine.001",
    "DEF-spine.002",
    "DEF-spine.003",
    "DEF-spine.004",
    "DEF-spine.006",
    "DEF-shoulder.L",
    "DEF-upper_arm.L",
    "DEF-forearm.L",
    "DEF-hand.L",
    "DEF-shoulder.R",
    "DEF-upper_arm.R",
    "DEF-forearm.R",
    "DEF-hand.R",
    "DEF-thigh.L",
    "DEF-shin.L",
    "DEF-foot.L",
    "DEF-toe.L",
    "DEF-thigh.R",
    "DEF-shin.R",
    "DEF-foot.R",
    "DEF-toe.R",
];

/// The deform rig's left shin is bound twisted 45° about its own axis.
const DEFORM_REST_CORRECTIONS: &[(LogicalJoint, Vec3)] =
    &[(LogicalJoint::LeftKnee, Vec3::new(0.0, 45.0, 0.0))];

/// Characters allowed between a deform pattern and the rest of a bone name
const DEFORM_DELIMITERS: [char; 3] = ['_', ':', ' '];

/// Deform-convention match: exact, or pattern followed by a delimiter.
/// `DEF-spine` must not match `DEF-spine.001`.
fn matches_deform(name: &str, pattern: &str) -> bool {
    let Some(rest) = name.strip_prefix(pattern) else {
        return false;
    };
    match rest.chars().next() {
        None => true,
        Some('.') => false,
        Some(c) => DEFORM_DELIMITERS.contains(&c),
    }
}

/// Strip the exporter prefix: `mixamorig1:LeftArm` -> `LeftArm`
fn strip_prefix(name: &str) -> &str {
    if let Some((_, tail)) = name.rsplit_once(':') {
        return tail;
    }
    if let Some(tail) = name.strip_prefix(PREFIXED_MARKER) {
        return tail.trim_start_matches(|c: char| c.is_ascii_digit());
    }
    name
}

fn find_bone<S, F>(skeleton: &S, mut pred: F) -> Option<RigBone>
where
    S: SkeletonHost + ?Sized,
    F: FnMut(&str) -> bool,
{
    skeleton.bones().find(|bone| pred(skeleton.bone_name(*bone)))
}

/// Resolve one joint to a bone. Pure lookup; `None` means the joint is
/// absent and should hold its rest pose.
pub fn resolve<S: SkeletonHost + ?Sized>(
    skeleton: &S,
    convention: RigConvention,
    joint: LogicalJoint,
) -> Option<RigBone> {
    let pattern = convention.pattern(joint);
    match convention {
        RigConvention::Deform => find_bone(skeleton, |name| matches_deform(name, pattern)),
        RigConvention::Prefixed => {
            let full = format!("{PREFIXED_MARKER}:{pattern}");
            let lowered = pattern.to_lowercase();
            find_bone(skeleton, |name| name == full)
                .or_else(|| find_bone(skeleton, |name| strip_prefix(name) == pattern))
                .or_else(|| find_bone(skeleton, |name| name.to_lowercase().contains(&lowered)))
        }
    }
}

/// Resolved joint table for one skeleton
#[derive(Debug, Clone)]
pub struct RigMap {
    convention: RigConvention,
    bones: [Option<RigBone>; LogicalJoint::COUNT],
}

impl RigMap {
    /// Detect the convention and resolve every logical joint
    pub fn resolve_all<S: SkeletonHost + ?Sized>(skeleton: &S) -> Self {
        let convention = RigConvention::detect(skeleton);
        let bones = LogicalJoint::ALL.map(|joint| resolve(skeleton, convention, joint));

        let map = Self { convention, bones };
        log::info!(
            "Rig convention {:?}: resolved {}/{} joints",
            convention,
            map.resolved().len(),
            LogicalJoint::COUNT
        );
        for joint in LogicalJoint::ALL {
            if map.bone(joint).is_none() {
                log::debug!("Joint {} not found on skeleton", joint.name());
            }
        }
        map
    }

    #[inline]
    pub fn convention(&self) -> RigConvention {
        self.convention
    }

    #[inline]
    pub fn bone(&self, joint: LogicalJoint) -> Option<RigBone> {
        self.bones[joint.index()]
    }

    /// Joints that resolved to a bone
    pub fn resolved(&self) -> JointMask {
        LogicalJoint::ALL
            .into_iter()
            .filter(|joint| self.bone(*joint).is_some())
            .collect()
    }

    /// `(joint, bone)` pairs for every resolved joint
    pub fn iter(&self) -> impl Iterator<Item = (LogicalJoint, RigBone)> + '_ {
        LogicalJoint::ALL
            .into_iter()
            .filter_map(|joint| self.bone(joint).map(|bone| (joint, bone)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::skeleton::Skeleton;
    use glam::Quat;

    /// Full prefixed-convention skeleton with identity bind pose
    pub(crate) fn prefixed_skeleton() -> Skeleton {
        let names: Vec<String> = PREFIXED_NAMES
            .iter()
            .map(|n| format!("mixamorig:{n}"))
            .collect();
        Skeleton::from_bind_pose(names.iter().map(|n| (n.as_str(), Quat::IDENTITY)))
    }

    /// Full deform-convention skeleton with generational extras
    pub(crate) fn deform_skeleton() -> Skeleton {
        let mut names: Vec<&str> = vec!["root", "DEF-spine.005", "DEF-upper_arm.L.001"];
        names.extend(DEFORM_NAMES.iter().rev());
        Skeleton::from_bind_pose(names.into_iter().map(|n| (n, Quat::IDENTITY)))
    }

    #[test]
    fn test_detect_convention() {
        assert_eq!(
            RigConvention::detect(&prefixed_skeleton()),
            RigConvention::Prefixed
        );
        assert_eq!(
            RigConvention::detect(&deform_skeleton()),
            RigConvention::Deform
        );

        let unknown = Skeleton::from_bind_pose([("pelvis", Quat::IDENTITY)]);
        assert_eq!(RigConvention::detect(&unknown), RigConvention::Prefixed);
    }

    #[test]
    fn test_prefixed_resolves_every_joint() {
        let skeleton = prefixed_skeleton();
        let map = RigMap::resolve_all(&skeleton);
        assert_eq!(map.resolved(), JointMask::all());
        let bone = map.bone(LogicalJoint::LeftElbow).unwrap();
        assert_eq!(skeleton.bone_name(bone), "mixamorig:LeftForeArm");
    }

    #[test]
    fn test_prefixed_priority_order() {
        // Exact full name wins over a numbered prefix listed first
        let skeleton = Skeleton::from_bind_pose([
            ("mixamorig1:Spine", Quat::IDENTITY),
            ("mixamorig:Spine", Quat::IDENTITY),
        ]);
        assert_eq!(
            resolve(&skeleton, RigConvention::Prefixed, LogicalJoint::Spine),
            Some(RigBone(1))
        );

        // Prefix-stripped exact match beats an earlier substring hit
        let skeleton = Skeleton::from_bind_pose([
            ("Spine1", Quat::IDENTITY),
            ("mixamorig7:Spine", Quat::IDENTITY),
        ]);
        assert_eq!(
            resolve(&skeleton, RigConvention::Prefixed, LogicalJoint::Spine),
            Some(RigBone(1))
        );

        // Case-insensitive substring as last resort
        let skeleton = Skeleton::from_bind_pose([("Armature_leftforearm_jnt", Quat::IDENTITY)]);
        assert_eq!(
            resolve(&skeleton, RigConvention::Prefixed, LogicalJoint::LeftElbow),
            Some(RigBone(0))
        );
    }

    #[test]
    fn test_prefix_without_colon() {
        assert_eq!(strip_prefix("mixamorigLeftArm"), "LeftArm");
        assert_eq!(strip_prefix("mixamorig12LeftArm"), "LeftArm");
        assert_eq!(strip_prefix("mixamorig1:LeftArm"), "LeftArm");
        assert_eq!(strip_prefix("LeftArm"), "LeftArm");
    }

    #[test]
    fn test_deform_rejects_generational_variants() {
        let skeleton = deform_skeleton();
        let map = RigMap::resolve_all(&skeleton);
        assert_eq!(map.resolved(), JointMask::all());

        assert_eq!(
            skeleton.bone_name(map.bone(LogicalJoint::Hips).unwrap()),
            "DEF-spine"
        );
        assert_eq!(
            skeleton.bone_name(map.bone(LogicalJoint::LeftShoulder).unwrap()),
            "DEF-upper_arm.L"
        );
    }

    #[test]
    fn test_deform_delimiters() {
        assert!(matches_deform("DEF-thigh.L", "DEF-thigh.L"));
        assert!(matches_deform("DEF-thigh.L_primitive0", "DEF-thigh.L"));
        assert!(!matches_deform("DEF-thigh.L.001", "DEF-thigh.L"));
        assert!(!matches_deform("DEF-spine.001", "DEF-spine"));
        assert!(!matches_deform("DEF-spineX", "DEF-spine"));
        assert!(!matches_deform("ORG-thigh.L", "DEF-thigh.L"));
    }

    #[test]
    fn test_partial_rig_leaves_joints_absent() {
        let skeleton = Skeleton::from_bind_pose([
            ("mixamorig:Hips", Quat::IDENTITY),
            ("mixamorig:Spine", Quat::IDENTITY),
        ]);
        let map = RigMap::resolve_all(&skeleton);
        assert!(map.bone(LogicalJoint::LeftToe).is_none());
        assert_eq!(map.bone(LogicalJoint::Hips), Some(RigBone(0)));
        // "Spine" also substring-matches nothing else here
        assert_eq!(map.bone(LogicalJoint::Chest), None);
    }
}
