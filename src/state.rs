//! Centralized application state with context passing pattern
//!
//! 1. `AppState` is a single struct holding the motion library and every
//!    character (skeleton, controller, callback state)
//! 2. Core functions take explicit references (`&MotionLibrary`,
//!    `&mut Skeleton`, ...)
//! 3. WASM bindings are thin wrappers that look up a character by handle
//!    and call into the pure core
//!
//! Characters never share playback state.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::animation::MotionLibrary;
use crate::config::PipelineConfig;
use crate::controller::{CharacterHooks, MotionController};
use crate::skeleton::{Skeleton, SkeletonHost};

/// Opaque character handle given to JS
pub type CharacterHandle = u32;

/// Values the host pushes in and reads back every frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostHooks {
    pub upper_body_yaw: f32,
    pub auto_ground_offset: f32,
    pub suppress_default: bool,
    /// Written by the controller each tick
    pub vertical_offset: f32,
}

impl CharacterHooks for HostHooks {
    fn upper_body_yaw(&self) -> f32 {
        self.upper_body_yaw
    }

    fn auto_ground_offset(&self) -> f32 {
        self.auto_ground_offset
    }

    fn set_vertical_offset(&mut self, y: f32) {
        self.vertical_offset = y;
    }

    fn suppresses_default(&self) -> bool {
        self.suppress_default
    }
}

/// One animated character
pub struct Character {
    pub skeleton: Skeleton,
    /// `None` when the rig is unsupported; the skeleton keeps its loaded pose
    pub controller: Option<MotionController>,
    pub hooks: HostHooks,
}

impl Character {
    pub fn new(skeleton: Skeleton, config: &PipelineConfig) -> Self {
        let controller = MotionController::bind(&skeleton, config.clone());
        Self {
            skeleton,
            controller,
            hooks: HostHooks::default(),
        }
    }

    /// Advance the controller one tick
    pub fn update(&mut self, library: &MotionLibrary, dt: f32) {
        if let Some(controller) = self.controller.as_mut() {
            controller.update(library, dt, &mut self.skeleton, &mut self.hooks);
        }
    }

    /// Flat `[x, y, z, w, ...]` with one entry per skeleton bone, in bone
    /// order. Bones with a transform node report the node's rotation.
    pub fn pose_buffer(&self) -> Vec<f32> {
        let rotations: Vec<glam::Quat> = self
            .skeleton
            .bones()
            .map(|bone| self.skeleton.effective_rotation(bone))
            .collect();
        bytemuck::cast_slice::<glam::Quat, f32>(&rotations).to_vec()
    }

    /// Last written pose keyed by bone name, `[x, y, z, w]`
    pub fn pose_by_name(&self) -> BTreeMap<String, [f32; 4]> {
        let Some(controller) = self.controller.as_ref() else {
            return BTreeMap::new();
        };
        controller
            .pose()
            .iter()
            .map(|(bone, q)| (self.skeleton.bone_name(*bone).to_string(), q.to_array()))
            .collect()
    }
}

/// Functions should take explicit references to what they need, not access
/// this struct directly via globals.
pub struct AppState {
    pub config: PipelineConfig,
    /// Registered motions (read-only during playback)
    pub library: MotionLibrary,
    characters: Vec<Option<Character>>,
}

impl AppState {
    pub fn new(config: PipelineConfig, library: MotionLibrary) -> Self {
        Self {
            config,
            library,
            characters: Vec::new(),
        }
    }

    /// Add a character, reusing a free slot if there is one
    pub fn create_character(&mut self, skeleton: Skeleton) -> CharacterHandle {
        let character = Character::new(skeleton, &self.config);
        if character.controller.is_none() {
            log::warn!("Character created without motion playback (unsupported rig)");
        }
        let index = match self.characters.iter().position(Option::is_none) {
            Some(index) => {
                self.characters[index] = Some(character);
                index
            }
            None => {
                self.characters.push(Some(character));
                self.characters.len() - 1
            }
        };
        index as CharacterHandle
    }

    pub fn destroy_character(&mut self, handle: CharacterHandle) -> bool {
        match self.characters.get_mut(handle as usize) {
            Some(slot @ Some(_)) => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    pub fn character(&self, handle: CharacterHandle) -> Option<&Character> {
        self.characters.get(handle as usize)?.as_ref()
    }

    pub fn character_mut(&mut self, handle: CharacterHandle) -> Option<&mut Character> {
        self.characters.get_mut(handle as usize)?.as_mut()
    }

    pub fn character_count(&self) -> usize {
        self.characters.iter().flatten().count()
    }

    /// Run `f` against a character's controller and the shared library
    pub fn with_controller<F, R>(&mut self, handle: CharacterHandle, f: F) -> Option<R>
    where
        F: FnOnce(&mut MotionController, &MotionLibrary) -> R,
    {
        let library = &self.library;
        let character = self.characters.get_mut(handle as usize)?.as_mut()?;
        character.controller.as_mut().map(|c| f(c, library))
    }

    pub fn update(&mut self, handle: CharacterHandle, dt: f32) {
        let library = &self.library;
        if let Some(character) = self
            .characters
            .get_mut(handle as usize)
            .and_then(Option::as_mut)
        {
            character.update(library, dt);
        }
    }

    /// Tick every character once
    pub fn update_all(&mut self, dt: f32) {
        let library = &self.library;
        for character in self.characters.iter_mut().flatten() {
            character.update(library, dt);
        }
    }

    /// Replace a character's skeleton and re-capture rest data.
    ///
    /// Returns false when the new skeleton is unsupported; the character
    /// then keeps its skeleton but loses motion playback.
    pub fn replace_skeleton(&mut self, handle: CharacterHandle, skeleton: Skeleton) -> bool {
        let config = self.config.clone();
        let Some(character) = self.character_mut(handle) else {
            return false;
        };
        character.skeleton = skeleton;
        let recaptured = character
            .controller
            .as_mut()
            .is_some_and(|c| c.recapture(&character.skeleton));
        if !recaptured {
            character.controller = MotionController::bind(&character.skeleton, config);
            if character.controller.is_none() {
                log::warn!("Character {} replaced with an unsupported rig", handle);
            }
        }
        character.controller.is_some()
    }
}

// Global state access, thin wrapper for WASM bindings only
thread_local! {
    static APP_STATE: RefCell<Option<AppState>> = const { RefCell::new(None) };
}

/// Execute a closure with immutable access to AppState
///
/// Returns None if AppState is not initialized
pub fn with_app_state<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&AppState) -> R,
{
    APP_STATE.with(|state| {
        let borrowed = state.borrow();
        borrowed.as_ref().map(f)
    })
}

/// Execute a closure with mutable access to AppState
///
/// Returns None if AppState is not initialized
pub fn with_app_state_mut<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&mut AppState) -> R,
{
    APP_STATE.with(|state| {
        let mut borrowed = state.borrow_mut();
        borrowed.as_mut().map(f)
    })
}

/// Initialize the global AppState. Replaces any previous state.
pub fn initialize_app_state(config: PipelineConfig, library: MotionLibrary) {
    APP_STATE.with(|state| {
        *state.borrow_mut() = Some(AppState::new(config, library));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bone::rig::tests::prefixed_skeleton;
    use glam::Quat;
    use std::f32::consts::FRAC_PI_4;

    fn app() -> AppState {
        AppState::new(
            PipelineConfig::default(),
            MotionLibrary::with_bundled().unwrap(),
        )
    }

    #[test]
    fn test_handles_are_reused() {
        let mut app = app();
        let a = app.create_character(prefixed_skeleton());
        let b = app.create_character(prefixed_skeleton());
        assert_ne!(a, b);
        assert_eq!(app.character_count(), 2);

        assert!(app.destroy_character(a));
        assert!(!app.destroy_character(a));
        assert!(app.character(a).is_none());

        let c = app.create_character(prefixed_skeleton());
        assert_eq!(c, a);
        assert_eq!(app.character_count(), 2);
    }

    #[test]
    fn test_unsupported_rig_is_tolerated() {
        let mut app = app();
        let h = app.create_character(Skeleton::from_bind_pose([("Cube", Quat::IDENTITY)]));
        assert!(app.character(h).unwrap().controller.is_none());
        assert_eq!(app.with_controller(h, |c, lib| c.play(lib, "idle", false)), None);
        app.update(h, 0.016);
        // The loaded pose is still exported
        assert_eq!(app.character(h).unwrap().pose_buffer(), vec![0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_characters_play_independently() {
        let mut app = app();
        let a = app.create_character(prefixed_skeleton());
        let b = app.create_character(prefixed_skeleton());

        assert_eq!(app.with_controller(a, |c, lib| c.play(lib, "idle", false)), Some(true));
        assert_eq!(
            app.with_controller(b, |c, lib| c.play(lib, "defensive_stance", false)),
            Some(true)
        );
        app.update_all(0.1);

        let name = |app: &mut AppState, h| {
            app.with_controller(h, |c, _| c.current_motion_name().map(str::to_string))
                .flatten()
        };
        assert_eq!(name(&mut app, a).as_deref(), Some("idle"));
        assert_eq!(name(&mut app, b).as_deref(), Some("defensive_stance"));
    }

    #[test]
    fn test_pose_exports() {
        let mut app = app();
        let h = app.create_character(prefixed_skeleton());
        app.with_controller(h, |c, lib| c.play(lib, "idle", false));
        app.update(h, 0.0);

        let character = app.character(h).unwrap();
        let buffer = character.pose_buffer();
        assert_eq!(buffer.len(), character.skeleton.bone_count() * 4);

        let by_name = character.pose_by_name();
        let hips = by_name["mixamorig:Hips"];
        let q = Quat::from_array(hips);
        assert!((q.length() - 1.0).abs() < 1e-5);
        // Hips is bone 0, so it leads the flat buffer
        assert_eq!(&buffer[..4], &hips[..]);
    }

    #[test]
    fn test_pose_buffer_covers_every_bone() {
        let mut app = app();
        app.library
            .register_json(
                r#"{ "name": "wave", "duration": 1.0, "loop": true,
                     "keyframes": { "rightShoulderZ": { "0": 0, "1.0": 90 } } }"#,
            )
            .unwrap();
        let skeleton = Skeleton::from_json(
            r#"{ "bones": [
                { "name": "root" },
                { "name": "mixamorig:Hips" },
                { "name": "prop", "bindRotation": [0, 0, 0.38268343, 0.9238795] },
                { "name": "mixamorig:RightArm", "hasTransformNode": true }
            ] }"#,
        )
        .unwrap();
        let h = app.create_character(skeleton);
        app.with_controller(h, |c, lib| {
            assert!(c.play(lib, "wave", false));
            c.set_current_time(0.5);
        });
        app.update(h, 0.0);

        let buffer = app.character(h).unwrap().pose_buffer();
        assert_eq!(buffer.len(), 16);
        let quat = |i: usize| Quat::from_slice(&buffer[i * 4..i * 4 + 4]);
        assert_eq!(quat(0), Quat::IDENTITY);
        assert!(quat(1).abs_diff_eq(Quat::IDENTITY, 1e-6));
        assert!(quat(2).abs_diff_eq(Quat::from_rotation_z(FRAC_PI_4), 1e-6));
        assert!(quat(3).abs_diff_eq(Quat::from_rotation_z(FRAC_PI_4), 1e-5));
    }

    #[test]
    fn test_replace_with_unsupported_rig_disables_playback() {
        let mut app = app();
        let h = app.create_character(prefixed_skeleton());
        app.with_controller(h, |c, lib| c.play(lib, "idle", false));
        app.update(h, 0.1);

        let cube = Skeleton::from_bind_pose([("Cube", Quat::IDENTITY)]);
        assert!(!app.replace_skeleton(h, cube));
        assert!(app.character(h).unwrap().controller.is_none());

        app.update(h, 0.1);
        let character = app.character(h).unwrap();
        assert!(character.pose_by_name().is_empty());
        assert_eq!(character.pose_buffer().len(), 4);

        // A supported skeleton brings playback back
        assert!(app.replace_skeleton(h, prefixed_skeleton()));
        assert_eq!(app.with_controller(h, |c, lib| c.play(lib, "idle", false)), Some(true));
    }

    #[test]
    fn test_jump_shot_raises_character() {
        let mut app = app();
        let h = app.create_character(prefixed_skeleton());
        app.with_controller(h, |c, lib| {
            assert!(c.play(lib, "jump_shot", false));
            c.set_current_time(0.7);
        });
        app.update(h, 0.0);
        let offset = app.character(h).unwrap().hooks.vertical_offset;
        assert!((offset - 0.55).abs() < 1e-5);
    }

    #[test]
    fn test_replace_skeleton_recaptures() {
        let mut app = app();
        let h = app.create_character(prefixed_skeleton());
        let mut skeleton = prefixed_skeleton();
        let hips = skeleton.find("mixamorig:Hips").unwrap();
        skeleton.bones[hips.index()].bind_rotation = Quat::from_rotation_y(1.0);

        assert!(app.replace_skeleton(h, skeleton));
        let rest = app
            .with_controller(h, |c, _| c.binding().rest_rotation(hips))
            .unwrap();
        assert!(rest.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-6));
    }
}
