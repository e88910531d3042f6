use crate::motion::{MotionDefinition, MotionError};
use std::collections::HashMap;

/// Sample motions shipped with the crate, validated by build.rs
pub const BUNDLED_MOTIONS: [&str; 4] = [
    include_str!("../assets/motions/idle.json"),
    include_str!("../assets/motions/dribble_walk.json"),
    include_str!("../assets/motions/jump_shot.json"),
    include_str!("../assets/motions/defensive_stance.json"),
];

/// Motion library - filled at startup, read-only during playback
///
/// Stores validated motion definitions by name. Every registration bumps
/// the generation so controllers know to drop their compiled tracks.
#[derive(Debug, Default)]
pub struct MotionLibrary {
    motions: HashMap<String, MotionDefinition>,
    generation: u64,
}

impl MotionLibrary {
    /// Create empty motion library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library preloaded with [`BUNDLED_MOTIONS`]
    pub fn with_bundled() -> Result<Self, MotionError> {
        let mut library = Self::new();
        for json in BUNDLED_MOTIONS {
            library.register_json(json)?;
        }
        Ok(library)
    }

    /// Add or replace a motion. Returns true if a motion of that name existed.
    pub fn register(&mut self, def: MotionDefinition) -> bool {
        log::info!(
            "Registered motion '{}' ({:.2}s{}{})",
            def.name,
            def.duration,
            if def.looping { ", loop" } else { "" },
            if def.is_delta { ", delta" } else { "" }
        );
        self.generation += 1;
        self.motions.insert(def.name.clone(), def).is_some()
    }

    /// Parse, validate and register a motion from JSON
    pub fn register_json(&mut self, json: &str) -> Result<(), MotionError> {
        let def = MotionDefinition::from_json(json)?;
        self.register(def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MotionDefinition> {
        self.motions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.motions.contains_key(name)
    }

    /// Registered motion names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.motions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Bumped on every registration
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Playback state - the motion being played and where in it we are
///
/// Value type: transitions return a new state instead of mutating.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    /// Current motion name
    pub motion: Option<String>,
    /// Current time in seconds, kept within `[0, duration)` while looping
    pub time: f32,
    pub speed: f32,
    pub paused: bool,
    /// A non-looping motion reached its end
    pub finished: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            motion: None,
            time: 0.0,
            speed: 1.0,
            paused: false,
            finished: false,
        }
    }
}

impl PlaybackState {
    /// Start playing `motion` from time 0
    pub fn new(motion: &str, speed: f32) -> Self {
        Self {
            motion: Some(motion.to_string()),
            speed,
            ..Self::default()
        }
    }

    /// Advance time by `delta_seconds × speed`.
    ///
    /// Looping motions wrap around `duration`. Non-looping motions stop at
    /// `duration` and are flagged finished. Paused or finished states are
    /// returned unchanged.
    pub fn advance(self, delta_seconds: f32, duration: f32, looping: bool) -> PlaybackState {
        if self.paused || self.finished || self.motion.is_none() {
            return self;
        }
        let time = self.time + delta_seconds * self.speed;
        if looping {
            let time = if duration > 0.0 {
                time.rem_euclid(duration)
            } else {
                0.0
            };
            return PlaybackState { time, ..self };
        }
        if time >= duration {
            return PlaybackState {
                time: duration,
                finished: true,
                ..self
            };
        }
        PlaybackState { time, ..self }
    }

    /// Change motion, reset time
    pub fn switch_to(self, motion: &str) -> PlaybackState {
        PlaybackState {
            motion: Some(motion.to_string()),
            time: 0.0,
            paused: false,
            finished: false,
            ..self
        }
    }

    /// Jump to `time`, clearing the finished flag
    pub fn seek(self, time: f32) -> PlaybackState {
        PlaybackState {
            time: time.max(0.0),
            finished: false,
            ..self
        }
    }

    pub fn with_paused(self, paused: bool) -> PlaybackState {
        PlaybackState { paused, ..self }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.motion.is_some() && !self.paused && !self.finished
    }
}
