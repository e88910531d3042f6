//! Skeleton access for the motion pipeline.
//!
//! The renderer owns the actual skeleton. The pipeline only needs a bone
//! list with stable names, each bone's bind-pose rotation, and a slot to
//! write the current local rotation into. [`SkeletonHost`] captures exactly
//! that; [`Skeleton`] is the in-memory implementation the browser host fills
//! from its scene graph (and the one tests use).

use glam::Quat;
use serde::{Deserialize, Serialize};

/// Handle to a concrete bone: its index in the host's bone list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RigBone(pub u32);

impl RigBone {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a bone's local rotation has to be written.
///
/// Some loaders drive a bone through a dedicated transform node; writing
/// to the bone directly would then be overwritten on the next sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePath {
    TransformNode,
    Direct,
}

/// Skeleton interface consumed by the motion pipeline
pub trait SkeletonHost {
    fn bone_count(&self) -> usize;

    fn bone_name(&self, bone: RigBone) -> &str;

    /// Animation-independent bind rotation. Never the current pose.
    fn bind_rotation(&self, bone: RigBone) -> Quat;

    /// Which slot the bone's rotation lives in
    fn write_path(&self, bone: RigBone) -> WritePath;

    /// Current local rotation as last written through `path`
    fn rotation(&self, bone: RigBone, path: WritePath) -> Quat;

    fn set_rotation(&mut self, bone: RigBone, path: WritePath, rotation: Quat);

    fn bones(&self) -> impl Iterator<Item = RigBone> {
        (0..self.bone_count() as u32).map(RigBone)
    }
}

/// Bone description as sent by the host
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkeletonBoneJson {
    pub name: String,
    /// Bind rotation as `[x, y, z, w]`
    #[serde(default = "identity")]
    pub bind_rotation: Quat,
    #[serde(default)]
    pub has_transform_node: bool,
}

fn identity() -> Quat {
    Quat::IDENTITY
}

/// JSON format for a whole skeleton
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkeletonJson {
    pub bones: Vec<SkeletonBoneJson>,
}

#[derive(Debug, Clone)]
pub struct SkeletonBone {
    pub name: String,
    pub bind_rotation: Quat,
    /// Local rotation written directly on the bone
    pub rotation: Quat,
    /// Rotation of the bone's transform node, when it has one
    pub node_rotation: Option<Quat>,
}

/// In-memory skeleton
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub bones: Vec<SkeletonBone>,
}

impl Skeleton {
    /// Build from `(name, bind rotation)` pairs, all bones written directly
    pub fn from_bind_pose<'a, I>(bones: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Quat)>,
    {
        Self {
            bones: bones
                .into_iter()
                .map(|(name, bind)| SkeletonBone {
                    name: name.to_string(),
                    bind_rotation: bind,
                    rotation: bind,
                    node_rotation: None,
                })
                .collect(),
        }
    }

    /// Parse from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let skeleton: SkeletonJson = serde_json::from_str(json)?;
        Ok(Self {
            bones: skeleton
                .bones
                .into_iter()
                .map(|b| SkeletonBone {
                    rotation: b.bind_rotation,
                    node_rotation: b.has_transform_node.then_some(b.bind_rotation),
                    name: b.name,
                    bind_rotation: b.bind_rotation,
                })
                .collect(),
        })
    }

    /// Find a bone by exact name
    pub fn find(&self, name: &str) -> Option<RigBone> {
        self.bones
            .iter()
            .position(|b| b.name == name)
            .map(|i| RigBone(i as u32))
    }

    /// Rotation the renderer will display for `bone`
    pub fn effective_rotation(&self, bone: RigBone) -> Quat {
        let b = &self.bones[bone.index()];
        b.node_rotation.unwrap_or(b.rotation)
    }
}

impl SkeletonHost for Skeleton {
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone_name(&self, bone: RigBone) -> &str {
        &self.bones[bone.index()].name
    }

    fn bind_rotation(&self, bone: RigBone) -> Quat {
        self.bones[bone.index()].bind_rotation
    }

    fn write_path(&self, bone: RigBone) -> WritePath {
        if self.bones[bone.index()].node_rotation.is_some() {
            WritePath::TransformNode
        } else {
            WritePath::Direct
        }
    }

    fn rotation(&self, bone: RigBone, path: WritePath) -> Quat {
        let b = &self.bones[bone.index()];
        match path {
            WritePath::TransformNode => b.node_rotation.unwrap_or(b.rotation),
            WritePath::Direct => b.rotation,
        }
    }

    fn set_rotation(&mut self, bone: RigBone, path: WritePath, rotation: Quat) {
        let b = &mut self.bones[bone.index()];
        match path {
            WritePath::TransformNode => b.node_rotation = Some(rotation),
            WritePath::Direct => b.rotation = rotation,
        }
    }
}
