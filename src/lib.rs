//! Hoops Motion - Wasm Core
//!
//! Procedural motion pipeline for skeletal basketball characters: declarative
//! keyframe motions are compiled against each rig's rest pose and played back
//! with blending, delta layering and jump trajectories.

pub mod animation;
#[cfg(target_arch = "wasm32")]
mod bindings;
pub mod bone;
pub mod config;
pub mod controller;
pub mod math;
pub mod motion;
pub mod skeleton;
pub mod state;

pub use animation::{MotionLibrary, PlaybackState, BUNDLED_MOTIONS};
pub use bone::{LogicalJoint, RigBinding, RigConvention};
pub use config::PipelineConfig;
pub use controller::{CharacterHooks, MotionController, Phase};
pub use glam::{Quat, Vec3};
pub use motion::{MotionDefinition, MotionError};
pub use skeleton::{RigBone, Skeleton, SkeletonHost, WritePath};

/// Route `log` output to the browser console. No-op on native targets.
pub fn init_logging(level: log::Level) {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            // Set up panic hook for better error messages in browser console
            console_error_panic_hook::set_once();
            console_log::init_with_level(level).ok();
        } else {
            let _ = level;
        }
    }
}
