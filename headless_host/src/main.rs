//! Headless host
//!
//! Drives one AR instance of the bridge through a full session against the
//! in-process headless engine: construction, surface setup, a timed scene
//! swap, a hit test, input, and teardown.
//!
//! Usage: `headless_host [config.toml|config.ron]`

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use immersive_bridge::foundation::logging;
use immersive_bridge::prelude::*;
use thiserror::Error;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const MAX_TRANSITION_FRAMES: usize = 240;

#[derive(Error, Debug)]
enum HostError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("bridge: {0}")]
    Bridge(#[from] BridgeError),
}

fn load_config() -> Result<BridgeConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load_from_file(&path)?,
        None => BridgeConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), HostError> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);
    log::info!("Starting headless host");

    let provider = HeadlessProvider::new(config.headless.clone())
        .with_plane(TrackedPlane::detected(
            Vec3::new(0.0, -1.2, -2.0),
            Vec3::new(0.0, 1.0, 0.0),
            1.5,
        ))
        .with_feature_point(Vec3::new(0.0, 0.0, -1.5));
    let (width, height) = (config.headless.surface_width, config.headless.surface_height);
    let platform = PlatformContext::new(DisplayInfo::new(width, height, 2.0), Rc::new(provider));

    let mut bridge = Bridge::new(config);
    let id = bridge.create_ar_session(
        &platform,
        AssetSource::new("assets"),
        ArSessionHandle {
            session: NativeRef(1),
            view: NativeRef(2),
        },
    )?;
    log::info!(
        "Instance {id:?}: headset '{}', controller '{}'",
        bridge.headset_name(id)?,
        bridge.controller_name(id)?
    );

    bridge.initialize_graphics_context(id)?;
    bridge.surface_created(id)?;
    bridge.surface_changed(id, width, height)?;
    bridge.start(id)?;

    let frames_seen = Rc::new(Cell::new(0_u64));
    let counter = Rc::clone(&frames_seen);
    let listener =
        bridge.register_frame_listener(move |_: &FrameInfo| counter.set(counter.get() + 1));
    bridge.add_frame_listener(id, listener)?;

    let lobby = bridge.register_scene(SceneRoot::new(NativeRef(100), "lobby"));
    let gallery = bridge.register_scene(SceneRoot::new(NativeRef(200), "gallery"));
    bridge.set_active_scene(id, Some(lobby))?;
    bridge.draw_frame(id)?;

    bridge.set_active_scene_with_transition(id, gallery, 0.5)?;
    for _ in 0..MAX_TRANSITION_FRAMES {
        let report = bridge.draw_frame(id)?;
        log::debug!(
            "Frame {}: {} root(s), progress {:?}",
            report.frame_number,
            report.renderable.len(),
            report.transition_progress
        );
        if report.transition_progress.is_none() {
            break;
        }
        thread::sleep(FRAME_INTERVAL);
    }

    bridge.hit_test_point(id, width as f32 * 0.5, height as f32 * 0.75, |outcome| match outcome {
        Ok(hits) => {
            for hit in &hits {
                log::info!("Hit {:?} at {:.2}m ({:?})", hit.kind, hit.distance, hit.position());
            }
            if hits.is_empty() {
                log::info!("Hit test found nothing");
            }
        }
        Err(failure) => log::warn!("Hit test failed: {failure}"),
    })?;
    bridge.wait_for_completions(Duration::from_secs(1));

    let center = (width as f32 * 0.5, height as f32 * 0.5);
    for action in [TouchAction::Down, TouchAction::Up] {
        bridge.dispatch_touch(id, TouchEvent { action, x: center.0, y: center.1 })?;
    }
    bridge.dispatch_pinch(
        id,
        PinchEvent {
            state: GestureState::Start,
            scale: 1.2,
            x: center.0,
            y: center.1,
        },
    )?;

    bridge.pause(id)?;
    bridge.resume(id)?;
    bridge.draw_frame(id)?;
    bridge.stop(id)?;
    bridge.surface_destroyed(id)?;
    bridge.destroy(id)?;
    bridge.release_instance(id)?;
    bridge.release_frame_listener(listener)?;

    log::info!("Headless host finished after {} frame(s)", frames_seen.get());
    Ok(())
}
