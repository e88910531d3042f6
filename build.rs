//! Build script for motion asset validation
//!
//! This script runs at compile time and validates every bundled motion JSON
//! file: channel keys must name a known joint and axis, time keys must lie
//! inside the motion's duration and values must be finite.

// Include the shared channel-key grammar
#[path = "src/motion/keys.rs"]
mod keys;

use heck::ToLowerCamelCase;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct Euler {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JumpPhysics {
    liftoff_time: f32,
    peak_time: f32,
    landing_time: f32,
    peak_height: f32,
    #[serde(default)]
    hang_time: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Motion {
    name: String,
    duration: f32,
    #[serde(default)]
    keyframes: BTreeMap<String, BTreeMap<String, f32>>,
    #[serde(default)]
    rigify_adjustments: BTreeMap<String, Euler>,
    #[serde(default)]
    position: BTreeMap<String, [f32; 3]>,
    #[serde(default)]
    jump_physics: Option<JumpPhysics>,
}

/// Suggest the lowerCamelCase spelling if that names a known joint
fn suggest_joint(name: &str) -> String {
    let camel = name.to_lower_camel_case();
    if keys::joint_index(&camel).is_some() {
        format!(" (did you mean '{}'?)", camel)
    } else {
        String::new()
    }
}

fn check_joint(errors: &mut Vec<String>, what: &str, joint: &str) {
    if keys::joint_index(joint).is_none() {
        errors.push(format!(
            "  {} '{}': unknown joint{}",
            what,
            joint,
            suggest_joint(joint)
        ));
    }
}

fn check_times<'a, I>(errors: &mut Vec<String>, channel: &str, duration: f32, times: I)
where
    I: IntoIterator<Item = &'a String>,
{
    for key in times {
        match keys::parse_time_key(key) {
            None => errors.push(format!("  {}: bad time key '{}'", channel, key)),
            Some(t) if !(0.0..=duration + 1e-4).contains(&t) => errors.push(format!(
                "  {}: time {:.3}s outside [0, {:.3}]",
                channel, t, duration
            )),
            Some(_) => {}
        }
    }
}

/// Validate a single motion
fn validate_motion(motion: &Motion) -> Vec<String> {
    let mut errors = Vec::new();

    if !(motion.duration.is_finite() && motion.duration > 0.0) {
        errors.push(format!("  duration must be positive, got {}", motion.duration));
        return errors;
    }

    for (channel, times) in &motion.keyframes {
        match keys::split_channel_key(channel) {
            Some((joint, _)) => check_joint(&mut errors, "channel", joint),
            None => errors.push(format!("  channel '{}': missing X/Y/Z axis suffix", channel)),
        }
        check_times(&mut errors, channel, motion.duration, times.keys());
        if times.values().any(|v| !v.is_finite()) {
            errors.push(format!("  {}: non-finite value", channel));
        }
    }

    for (joint, euler) in &motion.rigify_adjustments {
        check_joint(&mut errors, "adjustment", joint);
        if ![euler.x, euler.y, euler.z].iter().all(|v| v.is_finite()) {
            errors.push(format!("  adjustment '{}': non-finite value", joint));
        }
    }

    check_times(&mut errors, "position", motion.duration, motion.position.keys());

    if let Some(jump) = &motion.jump_physics {
        if jump.peak_height < 0.0 || jump.hang_time < 0.0 {
            errors.push("  jumpPhysics: negative height or hang time".to_string());
        }
        if jump.landing_time < jump.liftoff_time {
            errors.push("  jumpPhysics: landing before liftoff".to_string());
        }
        if jump.peak_time > jump.landing_time {
            errors.push("  jumpPhysics: peak after landing".to_string());
        }
    }

    errors
}

/// Validate a motion file
fn validate_motion_file(path: &Path) -> Result<(), String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let motion: Motion = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?;

    let errors = validate_motion(&motion);
    if errors.is_empty() {
        println!(
            "cargo:warning=✓ {} validated ({} channels)",
            motion.name,
            motion.keyframes.len()
        );
        Ok(())
    } else {
        Err(format!(
            "Motion '{}' ({}) is invalid:\n{}",
            motion.name,
            path.display(),
            errors.join("\n")
        ))
    }
}

fn main() {
    // Motion files to validate (relative to crate root)
    let motion_dir = Path::new("assets/motions");

    if !motion_dir.exists() {
        println!("cargo:warning=Motion directory not found, skipping validation");
        return;
    }

    // Rerun if the shared key grammar changes
    println!("cargo:rerun-if-changed=src/motion/keys.rs");

    let mut has_errors = false;

    // Find all JSON files in the motions directory
    if let Ok(entries) = fs::read_dir(motion_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                // Tell cargo to rerun if this file changes
                println!("cargo:rerun-if-changed={}", path.display());

                if let Err(e) = validate_motion_file(&path) {
                    println!("cargo:warning=VALIDATION ERROR: {}", e);
                    has_errors = true;
                }
            }
        }
    }

    if has_errors {
        panic!("Motion validation failed! Fix the bundled motion files.");
    }

    // Rerun if the motions directory changes
    println!("cargo:rerun-if-changed={}", motion_dir.display());
}
