use super::keys::{self, Axis};
use crate::bone::LogicalJoint;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Slack allowed on keyframe times past the declared duration (seconds)
const TIME_TOLERANCE: f32 = 1e-4;

/// Errors raised when a motion is registered
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("failed to parse motion JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("motion '{name}': duration must be positive and finite, got {duration}")]
    InvalidDuration { name: String, duration: f32 },

    #[error("motion '{name}': channel '{channel}' has unparsable time key '{key}'")]
    InvalidTimeKey {
        name: String,
        channel: String,
        key: String,
    },

    #[error("motion '{name}': channel '{channel}' has keyframe at {time}s outside [0, {duration}]")]
    TimeOutOfRange {
        name: String,
        channel: String,
        time: f32,
        duration: f32,
    },

    #[error("motion '{name}': channel '{channel}' has non-finite value at {time}s")]
    NonFiniteValue {
        name: String,
        channel: String,
        time: f32,
    },

    #[error("motion '{name}': invalid jump physics: {reason}")]
    InvalidJump { name: String, reason: &'static str },
}

/// Euler angles in degrees for JSON authoring (more intuitive than quaternions)
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct EulerAngles {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl EulerAngles {
    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    fn is_finite(&self) -> bool {
        self.to_vec3().is_finite()
    }
}

/// Two-phase parabolic vertical trajectory overriding the Y position channel
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JumpPhysics {
    pub liftoff_time: f32,
    pub peak_time: f32,
    pub landing_time: f32,
    pub peak_height: f32,
    #[serde(default)]
    pub hang_time: f32,
}

/// Sparse `time -> value` map as authored, e.g. `{"0": 10, "0.5": -20}`
pub type TimeMap<T> = BTreeMap<String, T>;

/// JSON format for a motion
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionDefinitionJson {
    pub name: String,
    pub duration: f32,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    #[serde(default)]
    pub is_delta: bool,
    #[serde(default = "default_interruptible")]
    pub interruptible: bool,
    #[serde(default)]
    pub blend_duration: Option<f32>,
    /// `"{jointName}{Axis}" -> {time: degrees}`
    #[serde(default)]
    pub keyframes: BTreeMap<String, TimeMap<f32>>,
    /// Static per-joint offsets applied on deform-convention rigs only
    #[serde(default)]
    pub rigify_adjustments: BTreeMap<String, EulerAngles>,
    /// Root position offsets `{time: [x, y, z]}`
    #[serde(default)]
    pub position: TimeMap<[f32; 3]>,
    #[serde(default)]
    pub jump_physics: Option<JumpPhysics>,
}

fn default_interruptible() -> bool {
    true
}

/// Sparse keyframes of one rotation channel, sorted by time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// `(time seconds, degrees)`
    pub keys: Vec<(f32, f32)>,
}

impl Channel {
    /// Value at exactly `time`, if a key exists there
    pub fn value_at(&self, time: f32) -> Option<f32> {
        self.keys
            .iter()
            .find(|(t, _)| (t - time).abs() <= f32::EPSILON)
            .map(|(_, v)| *v)
    }
}

/// Root position keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionKeyframe {
    pub time: f32,
    pub position: Vec3,
}

/// Validated, declarative motion
#[derive(Debug, Clone)]
pub struct MotionDefinition {
    pub name: String,
    pub duration: f32,
    pub looping: bool,
    pub is_delta: bool,
    pub interruptible: bool,
    pub blend_duration: Option<f32>,
    /// Channels keyed by their raw `"{jointName}{Axis}"` key
    pub channels: BTreeMap<String, Channel>,
    pub rigify_adjustments: BTreeMap<String, EulerAngles>,
    pub position: Vec<PositionKeyframe>,
    pub jump_physics: Option<JumpPhysics>,
}

impl MotionDefinition {
    /// Parse and validate from JSON string
    pub fn from_json(json: &str) -> Result<Self, MotionError> {
        let def: MotionDefinitionJson = serde_json::from_str(json)?;
        Self::from_authored(def)
    }

    /// Validate an authored motion.
    ///
    /// Rejects non-positive durations, unparsable or out-of-range times,
    /// non-finite values and inconsistent jump physics. Unknown joint names
    /// are only logged; they are skipped at compile time.
    pub fn from_authored(def: MotionDefinitionJson) -> Result<Self, MotionError> {
        let name = def.name;
        let duration = def.duration;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(MotionError::InvalidDuration { name, duration });
        }

        let mut channels = BTreeMap::new();
        for (channel, times) in def.keyframes {
            match keys::split_channel_key(&channel) {
                Some((joint, _)) if LogicalJoint::from_name(joint).is_some() => {}
                _ => log::warn!("Motion '{}': unknown channel '{}'", name, channel),
            }
            let parsed = parse_times(&name, &channel, duration, times)?;
            if let Some((time, _)) = parsed.iter().find(|(_, v)| !v.is_finite()) {
                return Err(MotionError::NonFiniteValue {
                    name,
                    channel,
                    time: *time,
                });
            }
            channels.insert(channel, Channel { keys: parsed });
        }

        for (joint, euler) in &def.rigify_adjustments {
            if LogicalJoint::from_name(joint).is_none() {
                log::warn!("Motion '{}': unknown adjustment joint '{}'", name, joint);
            }
            if !euler.is_finite() {
                return Err(MotionError::NonFiniteValue {
                    name,
                    channel: joint.clone(),
                    time: 0.0,
                });
            }
        }

        let position = parse_times(&name, "position", duration, def.position)?
            .into_iter()
            .map(|(time, [x, y, z])| PositionKeyframe {
                time,
                position: Vec3::new(x, y, z),
            })
            .collect::<Vec<_>>();
        if let Some(kf) = position.iter().find(|kf| !kf.position.is_finite()) {
            return Err(MotionError::NonFiniteValue {
                name,
                channel: "position".to_string(),
                time: kf.time,
            });
        }

        if let Some(jump) = &def.jump_physics {
            if let Some(reason) = jump.validate() {
                return Err(MotionError::InvalidJump { name, reason });
            }
        }

        Ok(Self {
            name,
            duration,
            looping: def.looping,
            is_delta: def.is_delta,
            interruptible: def.interruptible,
            blend_duration: def.blend_duration.filter(|d| d.is_finite() && *d >= 0.0),
            channels,
            rigify_adjustments: def.rigify_adjustments,
            position,
            jump_physics: def.jump_physics,
        })
    }

    /// Channels grouped by joint: `[X, Y, Z]` per joint. Unknown joints are skipped.
    pub fn joint_channels(&self) -> BTreeMap<LogicalJoint, [Option<&Channel>; 3]> {
        let mut grouped: BTreeMap<LogicalJoint, [Option<&Channel>; 3]> = BTreeMap::new();
        for (key, channel) in &self.channels {
            let Some((joint, axis)) = keys::split_channel_key(key) else {
                continue;
            };
            let Some(joint) = LogicalJoint::from_name(joint) else {
                continue;
            };
            grouped.entry(joint).or_default()[axis.index()] = Some(channel);
        }
        grouped
    }

    /// Static adjustment for `joint` in degrees
    pub fn adjustment(&self, joint: LogicalJoint) -> Option<Vec3> {
        self.rigify_adjustments
            .get(joint.name())
            .map(|euler| euler.to_vec3())
    }
}

impl JumpPhysics {
    fn validate(&self) -> Option<&'static str> {
        let times = [
            self.liftoff_time,
            self.peak_time,
            self.landing_time,
            self.peak_height,
            self.hang_time,
        ];
        if times.iter().any(|t| !t.is_finite()) {
            return Some("non-finite parameter");
        }
        if self.peak_height < 0.0 {
            return Some("negative peak height");
        }
        if self.hang_time < 0.0 {
            return Some("negative hang time");
        }
        if self.landing_time < self.liftoff_time {
            return Some("landing before liftoff");
        }
        None
    }
}

/// Parse time keys, check range, sort ascending
fn parse_times<T>(
    name: &str,
    channel: &str,
    duration: f32,
    times: TimeMap<T>,
) -> Result<Vec<(f32, T)>, MotionError> {
    let mut parsed = Vec::with_capacity(times.len());
    for (key, value) in times {
        let Some(time) = keys::parse_time_key(&key) else {
            return Err(MotionError::InvalidTimeKey {
                name: name.to_string(),
                channel: channel.to_string(),
                key,
            });
        };
        if time < 0.0 || time > duration + TIME_TOLERANCE {
            return Err(MotionError::TimeOutOfRange {
                name: name.to_string(),
                channel: channel.to_string(),
                time,
                duration,
            });
        }
        parsed.push((time.min(duration), value));
    }
    parsed.sort_by(|a, b| a.0.total_cmp(&b.0));
    // "1" and "1.0" name the same instant
    parsed.dedup_by(|a, b| a.0 == b.0);
    Ok(parsed)
}

/// Axis lookup helper for compiled channels
pub(crate) fn axis_value(channels: &[Option<&Channel>; 3], axis: Axis, time: f32) -> f32 {
    channels[axis.index()]
        .and_then(|c| c.value_at(time))
        .unwrap_or(0.0)
}
