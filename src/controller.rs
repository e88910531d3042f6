//! Per-character motion controller.
//!
//! Owns playback state, the blend snapshot and the compiled track cache for
//! one skeleton. The library, the skeleton and the character callbacks are
//! passed in on every call; nothing here is shared between characters.
//!
//! ```text
//!   Stopped --play--> Playing --play(other)--> Blending --elapsed--> Playing
//!                        |  ^                      |
//!                  pause |  | resume / play   pause|
//!                        v  |                      v
//!                       Paused <-------------------+
//! ```

use crate::animation::{MotionLibrary, PlaybackState};
use crate::bone::RigBinding;
use crate::config::PipelineConfig;
use crate::math::{conjugate_by, EPSILON};
use crate::motion::{
    evaluate, evaluate_blended, evaluate_layered, interpolate_position, wrap_time,
    CompiledPoseTrack, MotionDefinition, PoseMap,
};
use crate::skeleton::SkeletonHost;
use glam::Quat;
use std::collections::HashMap;

/// Blend completion slack (seconds)
const BLEND_TOLERANCE: f32 = 1e-5;

/// Callbacks into the character that owns the controller
pub trait CharacterHooks {
    /// Upper-body yaw override in radians
    fn upper_body_yaw(&self) -> f32 {
        0.0
    }

    /// Elevation correction from foot placement, in meters
    fn auto_ground_offset(&self) -> f32 {
        0.0
    }

    /// Receives the combined vertical root offset once per tick
    fn set_vertical_offset(&mut self, y: f32);

    /// True while an externally driven action forbids the default motion
    fn suppresses_default(&self) -> bool {
        false
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Playing,
    Blending,
    Paused,
}

#[derive(Debug, Clone)]
struct Blend {
    snapshot: PoseMap,
    elapsed: f32,
    duration: f32,
}

pub struct MotionController {
    config: PipelineConfig,
    binding: RigBinding,
    playback: PlaybackState,
    blend: Option<Blend>,
    tracks: HashMap<String, CompiledPoseTrack>,
    /// Library generation `tracks` were compiled against
    tracks_generation: u64,
    default_motion: Option<String>,
    base_motion: Option<String>,
    base_time: f32,
    joint_scale: f32,
    position_scale: f32,
    /// Evaluated pose before joint scale and yaw; blends start from it
    evaluated: PoseMap,
    /// Last pose written to the skeleton
    pose: PoseMap,
}

impl MotionController {
    pub fn new(binding: RigBinding, config: PipelineConfig) -> Self {
        let playback = PlaybackState {
            speed: config.default_speed,
            ..PlaybackState::default()
        };
        Self {
            config,
            binding,
            playback,
            blend: None,
            tracks: HashMap::new(),
            tracks_generation: 0,
            default_motion: None,
            base_motion: None,
            base_time: 0.0,
            joint_scale: 1.0,
            position_scale: 1.0,
            evaluated: PoseMap::new(),
            pose: PoseMap::new(),
        }
    }

    /// Bind to `skeleton`. `None` for unsupported rigs.
    pub fn bind<S: SkeletonHost + ?Sized>(skeleton: &S, config: PipelineConfig) -> Option<Self> {
        let binding = RigBinding::bind(skeleton, config.symmetry_tolerance)?;
        Some(Self::new(binding, config))
    }

    /// Re-capture rest poses after the skeleton's bind pose changed.
    /// Compiled tracks and cached poses refer to the old bones and are
    /// dropped; a blend in flight is abandoned.
    pub fn recapture<S: SkeletonHost + ?Sized>(&mut self, skeleton: &S) -> bool {
        let ok = self
            .binding
            .recapture(skeleton, self.config.symmetry_tolerance);
        if ok {
            self.tracks.clear();
            self.blend = None;
            self.evaluated.clear();
            self.pose.clear();
        }
        ok
    }

    /// A finished non-looping motion counts as stopped
    pub fn phase(&self) -> Phase {
        if self.playback.motion.is_none() || self.playback.finished {
            Phase::Stopped
        } else if self.playback.paused {
            Phase::Paused
        } else if self.blend.is_some() {
            Phase::Blending
        } else {
            Phase::Playing
        }
    }

    /// Start `name`. See [`MotionController::play_with_position_scale`].
    pub fn play(&mut self, library: &MotionLibrary, name: &str, force: bool) -> bool {
        self.play_with_position_scale(library, name, force, 1.0)
    }

    /// Start `name`, scaling its root position offsets by `scale`.
    ///
    /// Replaying the active motion is a no-op success. Switching away from
    /// a non-interruptible motion that has not finished fails unless
    /// `force` is set. Switching from an active motion blends; switching
    /// from nothing (or a finished motion) starts immediately.
    pub fn play_with_position_scale(
        &mut self,
        library: &MotionLibrary,
        name: &str,
        force: bool,
        scale: f32,
    ) -> bool {
        let Some(def) = library.get(name) else {
            log::warn!("Unknown motion '{}'", name);
            return false;
        };
        self.sync_tracks(library);

        let active = self
            .playback
            .motion
            .as_deref()
            .filter(|_| !self.playback.finished);

        if active == Some(name) {
            self.playback = self.playback.clone().with_paused(false);
            return true;
        }

        if let Some(current) = active.and_then(|n| library.get(n)) {
            if !current.interruptible && !force {
                log::debug!(
                    "Motion '{}' is not interruptible; '{}' rejected",
                    current.name,
                    name
                );
                return false;
            }
        }

        let blend_duration = def.blend_duration.unwrap_or(self.config.blend_duration);
        self.blend = if active.is_some() && blend_duration > 0.0 && !self.evaluated.is_empty() {
            Some(Blend {
                snapshot: self.evaluated.clone(),
                elapsed: 0.0,
                duration: blend_duration,
            })
        } else {
            None
        };

        self.ensure_track(def);
        self.position_scale = scale;
        self.playback = self.playback.clone().switch_to(name);
        true
    }

    /// Clear the active motion and any blend in flight
    pub fn stop(&mut self) {
        self.blend = None;
        self.playback = PlaybackState {
            speed: self.playback.speed,
            ..PlaybackState::default()
        };
    }

    pub fn pause(&mut self) {
        if self.playback.motion.is_some() {
            self.playback = self.playback.clone().with_paused(true);
        }
    }

    pub fn resume(&mut self) {
        self.playback = self.playback.clone().with_paused(false);
    }

    /// Scrub to `time`. A blend in flight is completed first.
    pub fn set_current_time(&mut self, time: f32) {
        self.blend = None;
        self.playback = self.playback.clone().seek(time);
    }

    pub fn current_time(&self) -> f32 {
        self.playback.time
    }

    /// Damp motion intensity: 1 plays as authored, 0 holds the rest pose
    pub fn set_joint_scale(&mut self, scale: f32) {
        self.joint_scale = scale.clamp(0.0, 1.0);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.playback.speed = speed.max(0.0);
    }

    /// Motion to fall back to when a non-looping motion ends
    pub fn set_default_motion(&mut self, name: Option<&str>) {
        self.default_motion = name.map(str::to_string);
    }

    /// Motion delta motions are layered on. Must be an absolute motion.
    pub fn set_base_motion(&mut self, library: &MotionLibrary, name: Option<&str>) -> bool {
        let Some(name) = name else {
            self.base_motion = None;
            return true;
        };
        match library.get(name) {
            Some(def) if !def.is_delta => {
                self.base_motion = Some(name.to_string());
                self.base_time = 0.0;
                true
            }
            Some(_) => {
                log::warn!("Base motion '{}' is itself a delta motion", name);
                false
            }
            None => {
                log::warn!("Unknown base motion '{}'", name);
                false
            }
        }
    }

    /// Active motion, or the blend target while blending
    pub fn current_motion_name(&self) -> Option<&str> {
        self.playback.motion.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn is_blending(&self) -> bool {
        self.blend.is_some()
    }

    /// Last pose written to the skeleton
    pub fn pose(&self) -> &PoseMap {
        &self.pose
    }

    pub fn binding(&self) -> &RigBinding {
        &self.binding
    }

    /// Advance one tick: evaluate, post-process, write bones, advance time.
    pub fn update<S, H>(&mut self, library: &MotionLibrary, dt: f32, skeleton: &mut S, hooks: &mut H)
    where
        S: SkeletonHost + ?Sized,
        H: CharacterHooks + ?Sized,
    {
        self.sync_tracks(library);

        let Some(name) = self.playback.motion.clone() else {
            return;
        };
        if self.playback.paused {
            return;
        }
        let Some(def) = library.get(&name) else {
            log::warn!("Motion '{}' is no longer registered", name);
            self.stop();
            return;
        };

        let blending = self.blend.is_some();
        let time = self.playback.time;
        let target = self.evaluate_motion(library, def, time);

        let mut pose = match self.blend.as_mut() {
            Some(blend) => {
                blend.elapsed += dt;
                let ratio = blend.elapsed / blend.duration;
                let pose = evaluate_blended(&blend.snapshot, &target, ratio);
                if blend.elapsed + BLEND_TOLERANCE >= blend.duration {
                    log::debug!("Blend into '{}' complete", name);
                    self.blend = None;
                }
                pose
            }
            None => target,
        };
        self.evaluated = pose.clone();

        self.apply_joint_scale(&mut pose);
        self.apply_yaw(&mut pose, hooks.upper_body_yaw());

        for (bone, rotation) in &pose {
            skeleton.set_rotation(*bone, self.binding.write_path(*bone), *rotation);
        }
        self.pose = pose;

        let elevation = interpolate_position(
            &def.position,
            wrap_time(time, def.duration, def.looping),
            def.jump_physics.as_ref(),
        )
        .map_or(0.0, |p| (p.y * self.position_scale).max(0.0));
        let ground = hooks.auto_ground_offset();
        hooks.set_vertical_offset(elevation + ground);

        if blending {
            return;
        }

        self.playback = self
            .playback
            .clone()
            .advance(dt, def.duration, def.looping);
        self.advance_base_time(library, dt);

        // Re-checked every tick so a suppressed return happens once
        // suppression ends
        if self.playback.finished {
            self.on_finished(library, &name, hooks);
        }
    }

    fn advance_base_time(&mut self, library: &MotionLibrary, dt: f32) {
        let time = self.base_time + dt * self.playback.speed;
        self.base_time = match self.base_motion.as_deref().and_then(|n| library.get(n)) {
            Some(base) if base.looping => time.rem_euclid(base.duration),
            Some(base) => time.min(base.duration),
            None => 0.0,
        };
    }

    fn on_finished<H: CharacterHooks + ?Sized>(
        &mut self,
        library: &MotionLibrary,
        finished: &str,
        hooks: &H,
    ) {
        let Some(default) = self.default_motion.clone() else {
            return;
        };
        if default == finished || hooks.suppresses_default() {
            return;
        }
        log::debug!("Motion '{}' finished; returning to '{}'", finished, default);
        self.play(library, &default, true);
    }

    /// Drop compiled tracks when the library changed since they were built
    fn sync_tracks(&mut self, library: &MotionLibrary) {
        if self.tracks_generation != library.generation() {
            self.tracks.clear();
            self.tracks_generation = library.generation();
        }
    }

    fn ensure_track(&mut self, def: &MotionDefinition) {
        if !self.tracks.contains_key(&def.name) {
            let track = CompiledPoseTrack::build(def, &self.binding, self.config.frames_per_second);
            self.tracks.insert(def.name.clone(), track);
        }
    }

    fn evaluate_motion(&mut self, library: &MotionLibrary, def: &MotionDefinition, time: f32) -> PoseMap {
        self.ensure_track(def);
        let base_def = if def.is_delta {
            self.base_motion
                .as_deref()
                .and_then(|name| library.get(name))
        } else {
            None
        };
        if let Some(base) = base_def {
            self.ensure_track(base);
        }

        let Some(track) = self.tracks.get(&def.name) else {
            return PoseMap::new();
        };
        if !def.is_delta {
            return evaluate(track, time);
        }
        let base = base_def
            .and_then(|b| self.tracks.get(&b.name))
            .map(|t| (t, self.base_time));
        evaluate_layered(base, track, time, &self.binding.rest)
    }

    fn apply_joint_scale(&self, pose: &mut PoseMap) {
        if self.joint_scale >= 1.0 {
            return;
        }
        let toward_rest = 1.0 - self.joint_scale;
        for (bone, rotation) in pose.iter_mut() {
            *rotation = rotation.slerp(self.binding.rest_rotation(*bone), toward_rest);
        }
    }

    /// `rest · Ry(yaw) · rest⁻¹` on the yaw joint, so the yaw acts in the
    /// bone's own frame as if it had been authored into the offset.
    fn apply_yaw(&self, pose: &mut PoseMap, yaw: f32) {
        if yaw.abs() <= EPSILON {
            return;
        }
        let Some(bone) = self.binding.bone(self.config.yaw_joint) else {
            return;
        };
        let rest = self.binding.rest_rotation(bone);
        let rotation = pose.entry(bone).or_insert(rest);
        *rotation = (conjugate_by(rest, Quat::from_rotation_y(yaw)) * *rotation).normalize();
    }
}
