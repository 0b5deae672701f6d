//! # Immersive Bridge
//!
//! Lifecycle and event bridge between a host application and an opaque
//! VR/AR rendering engine.
//!
//! ## Features
//!
//! - **Backend Selection**: headset SDK, standalone headset, AR session and
//!   embedded scene view backends with capability gating
//! - **Lifecycle State Machine**: every legal host ordering is accepted,
//!   every illegal one is reported
//! - **Scene Transitions**: immediate and timed swaps of the active scene root
//! - **Async Hit Testing**: spatial queries completed over a channel, each
//!   handler run exactly once
//! - **Frame Listeners**: idempotent per-frame hooks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use immersive_bridge::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BridgeConfig::default();
//!     let provider = Rc::new(HeadlessProvider::new(config.headless.clone()));
//!     let platform = PlatformContext::new(DisplayInfo::new(1280, 720, 2.0), provider);
//!
//!     let mut bridge = Bridge::new(config);
//!     let id = bridge.create_scene_view(
//!         &platform,
//!         AssetSource::new("assets"),
//!         SceneViewRef { view: NativeRef(1) },
//!     )?;
//!
//!     bridge.initialize_graphics_context(id)?;
//!     bridge.start(id)?;
//!     bridge.draw_frame(id)?;
//!     bridge.destroy(id)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod backend;
pub mod lifecycle;
pub mod events;
pub mod scene;
pub mod query;
pub mod frame;
pub mod engine;

mod bridge;
mod error;
mod instance;

#[cfg(test)]
mod tests;

pub use bridge::{Bridge, FrameReport};
pub use error::{BridgeError, BridgeResult};
pub use foundation::collections::{InstanceId, ListenerHandle, NodeHandle, QueryToken, SceneHandle};

/// Common imports for bridge users
pub mod prelude {
    pub use crate::backend::{
        ActivityRef, ArSessionHandle, AssetSource, BackendKind, Capabilities, DisplayInfo,
        HeadsetSdkContext, NativeRef, PlatformContext, SceneViewRef,
    };
    pub use crate::config::{BridgeConfig, Config, ConfigError, ConfigFormat};
    pub use crate::engine::headless::{HeadlessProvider, TrackedPlane};
    pub use crate::events::{
        Dispatch, GestureState, KeyAction, KeyEvent, PinchEvent, RotateEvent, TouchAction,
        TouchEvent,
    };
    pub use crate::foundation::math::Vec3;
    pub use crate::frame::{FrameInfo, FrameListener};
    pub use crate::lifecycle::{LifecycleState, SurfaceState};
    pub use crate::query::{HitResultKind, HitTestOutcome, HitTestResult, QueryFailure};
    pub use crate::scene::{SceneNode, SceneRoot};
    pub use crate::{
        Bridge, BridgeError, BridgeResult, FrameReport, InstanceId, ListenerHandle, NodeHandle,
        SceneHandle,
    };
}
