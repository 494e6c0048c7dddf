//! Interaction sandbox
//!
//! Builds a small room (floor, hinged door, cup, crate), drives both hands
//! through a scripted sequence of interactions, and prints the resulting
//! performance metrics as JSON.
//!
//! Run with: cargo run -p void_interaction_sandbox -- [profile.toml]
//!
//! The profile is taken from the first argument, then the
//! `VOID_SANDBOX_PROFILE` environment variable, then built-in defaults.

mod scene;

use serde::Serialize;
use std::path::PathBuf;
use void_interaction::prelude::*;

const PROFILE_ENV: &str = "VOID_SANDBOX_PROFILE";

#[derive(Debug, Serialize)]
struct Summary {
    profile: String,
    frames: u64,
    interactions: usize,
    rejected: usize,
    haptic_events: usize,
    visual_events: usize,
    metrics: PerformanceMetrics,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    if let Err(e) = run() {
        log::error!("Sandbox failed: {}", e);
        std::process::exit(1);
    }
}

fn profile_path() -> Option<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Some(PathBuf::from(arg));
    }
    match std::env::var(PROFILE_ENV) {
        Ok(path) if !path.is_empty() => {
            log::info!("Profile from env: {}", path);
            Some(PathBuf::from(path))
        }
        _ => None,
    }
}

fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let profile = match profile_path() {
        Some(path) => {
            log::info!("Loading profile {}", path.display());
            load_profile(&path)?
        }
        None => {
            log::info!("Using built-in profile");
            InteractionProfile::default()
        }
    };

    let mut engine = InteractionEngine::new(profile)?;
    let (sink, receiver) = ChannelSink::unbounded();
    engine.set_sink(Box::new(sink));

    let room = scene::Room::build(&mut engine)?;
    let outcome = scene::play(&mut engine, &room)?;

    let (mut haptic_events, mut visual_events) = (0, 0);
    for event in receiver.try_iter() {
        match event {
            FeedbackEvent::Haptic(_) => haptic_events += 1,
            FeedbackEvent::Visual(_) => visual_events += 1,
        }
    }

    let metrics = engine.metrics();
    let summary = Summary {
        profile: engine.profile().name.clone(),
        frames: metrics.frames,
        interactions: outcome.performed,
        rejected: outcome.rejected,
        haptic_events,
        visual_events,
        metrics,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
