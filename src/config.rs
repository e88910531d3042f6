use crate::bone::{LogicalJoint, SYMMETRY_TOLERANCE};
use serde::{Deserialize, Serialize};

/// Tunables shared by every character of a session
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Frame rate tracks are compiled at. Must be the same for every track.
    #[serde(default = "default_fps")]
    pub frames_per_second: f32,

    /// Cross-motion blend time (seconds) when a motion sets none
    #[serde(default = "default_blend_duration")]
    pub blend_duration: f32,

    #[serde(default = "default_symmetry_tolerance")]
    pub symmetry_tolerance: f32,

    /// Joint receiving the upper-body yaw override
    #[serde(default = "default_yaw_joint")]
    pub yaw_joint: LogicalJoint,

    #[serde(default = "default_speed")]
    pub default_speed: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frames_per_second: default_fps(),
            blend_duration: default_blend_duration(),
            symmetry_tolerance: default_symmetry_tolerance(),
            yaw_joint: default_yaw_joint(),
            default_speed: default_speed(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn default_fps() -> f32 {
    30.0
}

fn default_blend_duration() -> f32 {
    0.3
}

fn default_symmetry_tolerance() -> f32 {
    SYMMETRY_TOLERANCE
}

fn default_yaw_joint() -> LogicalJoint {
    LogicalJoint::Spine
}

fn default_speed() -> f32 {
    1.0
}
