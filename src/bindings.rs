//! JS-facing API. Thin wrappers over `state`; every character is addressed
//! by the handle `create_character` returned.

use crate::animation::MotionLibrary;
use crate::config::PipelineConfig;
use crate::controller::MotionController;
use crate::skeleton::Skeleton;
use crate::state::{self, CharacterHandle, HostHooks};
use wasm_bindgen::prelude::*;

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {e}"))
}

/// Helper to access a character's controller together with the library
fn with_controller<F, R>(handle: CharacterHandle, f: F) -> Option<R>
where
    F: FnOnce(&mut MotionController, &MotionLibrary) -> R,
{
    state::with_app_state_mut(|app| app.with_controller(handle, f)).flatten()
}

fn with_hooks_mut<F>(handle: CharacterHandle, f: F)
where
    F: FnOnce(&mut HostHooks),
{
    state::with_app_state_mut(|app| app.character_mut(handle).map(|c| f(&mut c.hooks)));
}

/// Set up logging and state. Bundled motions are registered up front.
#[wasm_bindgen]
pub fn init_motion(config_json: Option<String>) -> Result<(), JsValue> {
    crate::init_logging(log::Level::Info);

    let config = match config_json {
        Some(json) => PipelineConfig::from_json(&json).map_err(|e| js_error("Invalid config", e))?,
        None => PipelineConfig::default(),
    };
    let library =
        MotionLibrary::with_bundled().map_err(|e| js_error("Bundled motion rejected", e))?;
    log::info!("Motion pipeline ready ({} motions)", library.len());
    state::initialize_app_state(config, library);
    Ok(())
}

/// Register (or replace) a motion from its JSON definition
#[wasm_bindgen]
pub fn register_motion(json: &str) -> Result<(), JsValue> {
    state::with_app_state_mut(|app| app.library.register_json(json))
        .ok_or_else(|| JsValue::from_str("Not initialized"))?
        .map_err(|e| js_error("Failed to register motion", e))
}

#[wasm_bindgen]
pub fn motion_names() -> Vec<String> {
    state::with_app_state(|app| {
        app.library
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Create a character from a skeleton description. Unsupported rigs still
/// get a handle; they just never animate.
#[wasm_bindgen]
pub fn create_character(skeleton_json: &str) -> Result<CharacterHandle, JsValue> {
    let skeleton =
        Skeleton::from_json(skeleton_json).map_err(|e| js_error("Failed to parse skeleton", e))?;
    state::with_app_state_mut(|app| app.create_character(skeleton))
        .ok_or_else(|| JsValue::from_str("Not initialized"))
}

#[wasm_bindgen]
pub fn destroy_character(handle: CharacterHandle) -> bool {
    state::with_app_state_mut(|app| app.destroy_character(handle)).unwrap_or(false)
}

/// Swap in a new bind pose and re-capture rest data
#[wasm_bindgen]
pub fn replace_skeleton(handle: CharacterHandle, skeleton_json: &str) -> Result<bool, JsValue> {
    let skeleton =
        Skeleton::from_json(skeleton_json).map_err(|e| js_error("Failed to parse skeleton", e))?;
    Ok(state::with_app_state_mut(|app| app.replace_skeleton(handle, skeleton)).unwrap_or(false))
}

#[wasm_bindgen]
pub fn play(handle: CharacterHandle, name: &str, force: bool) -> bool {
    with_controller(handle, |c, lib| c.play(lib, name, force)).unwrap_or(false)
}

#[wasm_bindgen]
pub fn play_with_position_scale(handle: CharacterHandle, name: &str, scale: f32) -> bool {
    with_controller(handle, |c, lib| c.play_with_position_scale(lib, name, false, scale))
        .unwrap_or(false)
}

#[wasm_bindgen]
pub fn stop(handle: CharacterHandle) {
    with_controller(handle, |c, _| c.stop());
}

#[wasm_bindgen]
pub fn pause(handle: CharacterHandle) {
    with_controller(handle, |c, _| c.pause());
}

#[wasm_bindgen]
pub fn resume(handle: CharacterHandle) {
    with_controller(handle, |c, _| c.resume());
}

#[wasm_bindgen]
pub fn set_current_time(handle: CharacterHandle, time: f32) {
    with_controller(handle, |c, _| c.set_current_time(time));
}

#[wasm_bindgen]
pub fn set_joint_scale(handle: CharacterHandle, scale: f32) {
    with_controller(handle, |c, _| c.set_joint_scale(scale));
}

#[wasm_bindgen]
pub fn set_speed(handle: CharacterHandle, speed: f32) {
    with_controller(handle, |c, _| c.set_speed(speed));
}

#[wasm_bindgen]
pub fn set_default_motion(handle: CharacterHandle, name: Option<String>) {
    with_controller(handle, |c, _| c.set_default_motion(name.as_deref()));
}

#[wasm_bindgen]
pub fn set_base_motion(handle: CharacterHandle, name: Option<String>) -> bool {
    with_controller(handle, |c, lib| c.set_base_motion(lib, name.as_deref())).unwrap_or(false)
}

#[wasm_bindgen]
pub fn current_motion_name(handle: CharacterHandle) -> Option<String> {
    with_controller(handle, |c, _| c.current_motion_name().map(str::to_string)).flatten()
}

#[wasm_bindgen]
pub fn is_playing(handle: CharacterHandle) -> bool {
    with_controller(handle, |c, _| c.is_playing()).unwrap_or(false)
}

#[wasm_bindgen]
pub fn set_upper_body_yaw(handle: CharacterHandle, radians: f32) {
    with_hooks_mut(handle, |hooks| hooks.upper_body_yaw = radians);
}

#[wasm_bindgen]
pub fn set_auto_ground_offset(handle: CharacterHandle, meters: f32) {
    with_hooks_mut(handle, |hooks| hooks.auto_ground_offset = meters);
}

#[wasm_bindgen]
pub fn set_suppress_default(handle: CharacterHandle, suppress: bool) {
    with_hooks_mut(handle, |hooks| hooks.suppress_default = suppress);
}

/// Combined vertical root offset computed by the last update
#[wasm_bindgen]
pub fn vertical_offset(handle: CharacterHandle) -> f32 {
    state::with_app_state(|app| app.character(handle).map(|c| c.hooks.vertical_offset))
        .flatten()
        .unwrap_or(0.0)
}

/// Advance one character (call exactly once per frame with delta time)
#[wasm_bindgen]
pub fn update(handle: CharacterHandle, delta_ms: f32) {
    let delta_secs = delta_ms / 1000.0;
    state::with_app_state_mut(|app| app.update(handle, delta_secs));
}

#[wasm_bindgen]
pub fn update_all(delta_ms: f32) {
    let delta_secs = delta_ms / 1000.0;
    state::with_app_state_mut(|app| app.update_all(delta_secs));
}

/// Current rotation of every skeleton bone as a flat `[x, y, z, w, ...]`
/// array, `bone_count × 4` long and in skeleton bone order
#[wasm_bindgen]
pub fn pose_buffer(handle: CharacterHandle) -> Vec<f32> {
    state::with_app_state(|app| app.character(handle).map(|c| c.pose_buffer()))
        .flatten()
        .unwrap_or_default()
}

/// Last written pose as `{ boneName: [x, y, z, w] }`, for debug panels
#[wasm_bindgen]
pub fn pose_snapshot(handle: CharacterHandle) -> Result<JsValue, JsValue> {
    let pose = state::with_app_state(|app| app.character(handle).map(|c| c.pose_by_name()))
        .flatten()
        .unwrap_or_default();
    serde_wasm_bindgen::to_value(&pose).map_err(|e| js_error("Failed to export pose", e))
}
