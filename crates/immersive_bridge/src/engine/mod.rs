//! Boundary to the opaque native rendering engine
//!
//! The bridge never renders anything itself. It drives a [`RenderEngine`]
//! supplied by the platform's [`EngineProvider`], forwarding validated
//! lifecycle, surface, input and scene calls in submission order.
//!
//! All methods are called from the host's designated thread. The one
//! exception to single-threaded use is [`RenderEngine::hit_test`]: the
//! engine may complete the [`HitTestResponder`] from any thread.

pub mod headless;

use std::time::Duration;

use thiserror::Error;

use crate::backend::{BackendSpec, NativeRef};
use crate::events::{KeyEvent, PinchEvent, RotateEvent, TouchEvent};
use crate::query::{HitTestQuery, HitTestResponder};

/// Engine-side failure reported during construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineFault(pub String);

/// Which scene roots the engine should render
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneBinding {
    /// Render nothing
    Detached,
    /// Render `root` starting with the next frame
    Immediate {
        /// Scene root to render
        root: NativeRef,
    },
    /// Render both roots and interpolate from `outgoing` to `incoming`
    Transition {
        /// Root fading out, if any
        outgoing: Option<NativeRef>,
        /// Root fading in
        incoming: NativeRef,
        /// Wall-clock length of the interpolation
        duration: Duration,
    },
}

/// Per-frame input handed to [`RenderEngine::draw_frame`]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    /// Monotonic frame counter for this instance
    pub frame_number: u64,
    /// Time of the frame on the bridge clock
    pub timestamp: Duration,
    /// Scene roots eligible for rendering, outgoing first
    pub renderable: Vec<NativeRef>,
    /// Progress of the running transition in `[0, 1]`
    pub transition_progress: Option<f32>,
    /// Node driving the camera, if not the default camera
    pub point_of_view: Option<NativeRef>,
}

/// Native engine bound to one display surface and one backend
pub trait RenderEngine {
    /// Set up the graphics context
    fn initialize_graphics(&mut self);

    /// Host started
    fn on_start(&mut self);

    /// Host paused
    fn on_pause(&mut self);

    /// Host resumed
    fn on_resume(&mut self);

    /// Host stopped
    fn on_stop(&mut self);

    /// Display surface was created
    fn on_surface_created(&mut self);

    /// Display surface changed size
    fn on_surface_changed(&mut self, width: u32, height: u32);

    /// Display surface was destroyed
    fn on_surface_destroyed(&mut self);

    /// Render one frame
    fn draw_frame(&mut self, frame: &FrameContext);

    /// Touch input
    fn on_touch(&mut self, event: TouchEvent);

    /// Key input
    fn on_key(&mut self, event: KeyEvent);

    /// Pinch gesture; only called on backends with gesture tracking
    fn on_pinch(&mut self, event: PinchEvent);

    /// Rotate gesture; only called on backends with gesture tracking
    fn on_rotate(&mut self, event: RotateEvent);

    /// Replace the rendered scene roots
    fn set_scene(&mut self, binding: SceneBinding);

    /// Rebind the camera to `node`, or to the default camera
    fn set_point_of_view(&mut self, node: Option<NativeRef>);

    /// Pause or resume rendering without a lifecycle transition
    fn set_suspended(&mut self, suspended: bool);

    /// Show or hide the debug overlay
    fn set_debug_hud(&mut self, enabled: bool);

    /// Switch stereo presentation on or off; headset SDK backends only
    fn set_vr_mode(&mut self, enabled: bool);

    /// Reset the tracked forward direction; standalone headset backends only
    fn recenter_tracking(&mut self);

    /// Name of the connected headset
    fn headset_name(&self) -> String;

    /// Name of the connected controller
    fn controller_name(&self) -> String;

    /// Start a spatial query; AR backends only
    ///
    /// The responder must be completed exactly once, from any thread.
    fn hit_test(&mut self, query: HitTestQuery, responder: HitTestResponder);

    /// Release all native resources
    fn destroy(&mut self);
}

/// Platform factory for native engines
pub trait EngineProvider {
    /// Create an engine for a validated backend request
    fn spawn(&self, spec: &BackendSpec) -> Result<Box<dyn RenderEngine>, EngineFault>;
}
