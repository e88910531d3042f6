//! Declarative motions and their compilation to pose tracks.
//!
//! `definition` -> `compiler` -> `compose` -> `track` -> `player`, with
//! `position` evaluated alongside.

pub mod compiler;
pub mod compose;
pub mod definition;
pub mod keys;
pub mod player;
pub mod position;
pub mod track;

pub use compiler::{compile, time_to_frame, BoneOffsets, OffsetKeyframe};
pub use compose::{compose, compose_offset, PoseKeyframe};
pub use definition::{EulerAngles, JumpPhysics, MotionDefinition, MotionDefinitionJson, MotionError};
pub use player::{evaluate, evaluate_blended, evaluate_layered, wrap_time, PoseMap};
pub use position::{interpolate_position, jump_height};
pub use track::{BoneTrack, CompiledPoseTrack, TrackKind};
