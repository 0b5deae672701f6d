//! Lifecycle state machine
//!
//! Host frameworks deliver lifecycle signals in orders this crate does not
//! control. [`Lifecycle`] turns every legal ordering into a valid engine
//! state and rejects every illegal one with an error, leaving the state
//! untouched.
//!
//! ```text
//!   Created ─initialize_graphics─► GlReady ─start─► Started ◄─resume── Paused
//!                                                  │  ▲  └───pause────►  │
//!                                                stop start              │
//!                                                  ▼  │                  │
//!                                                 Stopped ◄────stop──────┘
//!
//!   any ─destroy─► Destroyed (terminal)
//! ```
//!
//! Surface callbacks are orthogonal to the run state and are accepted from
//! `GlReady` until `Destroyed`. The suspended flag is orthogonal as well.

use std::fmt;

use crate::error::{BridgeError, BridgeResult};

/// Run state of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Constructed; no graphics context yet
    Created,
    /// Graphics context initialized
    GlReady,
    /// Running and drawing
    Started,
    /// Paused by the host; input still accepted
    Paused,
    /// Stopped by the host; may be started again
    Stopped,
    /// Torn down; terminal
    Destroyed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Host-driven lifecycle signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Graphics context became available
    InitializeGraphics,
    /// Host started (or restarted) the surface owner
    Start,
    /// Host paused the surface owner
    Pause,
    /// Host resumed the surface owner
    Resume,
    /// Host stopped the surface owner
    Stop,
    /// Host is tearing the instance down
    Destroy,
}

impl LifecycleEvent {
    /// Operation name used in errors and logs
    pub fn operation(self) -> &'static str {
        match self {
            Self::InitializeGraphics => "initialize_graphics_context",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Destroy => "destroy",
        }
    }
}

impl LifecycleState {
    /// State reached by applying `event`, or `None` if the transition is illegal
    pub fn next(self, event: LifecycleEvent) -> Option<Self> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        match (self, event) {
            (S::Destroyed, _) => None,
            (_, E::Destroy) => Some(S::Destroyed),
            (S::Created, E::InitializeGraphics) => Some(S::GlReady),
            (S::GlReady | S::Stopped, E::Start) => Some(S::Started),
            (S::Started, E::Pause) => Some(S::Paused),
            (S::Paused, E::Resume) => Some(S::Started),
            (S::Started | S::Paused, E::Stop) => Some(S::Stopped),
            _ => None,
        }
    }

    /// Whether surface callbacks are accepted
    pub fn accepts_surface(self) -> bool {
        matches!(self, Self::GlReady | Self::Started | Self::Paused | Self::Stopped)
    }

    /// Whether discrete input events are accepted
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Started | Self::Paused)
    }

    /// Whether a frame may be drawn
    pub fn can_draw(self) -> bool {
        self == Self::Started
    }

    /// Whether the instance has been torn down
    pub fn is_destroyed(self) -> bool {
        self == Self::Destroyed
    }
}

/// Display surface as last reported by the surface collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// No surface, or it was destroyed
    Absent,
    /// Surface exists but no size was reported yet
    Created,
    /// Surface exists with a known size
    Sized {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
}

/// Lifecycle bookkeeping for one engine instance
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
    surface: SurfaceState,
    suspended: bool,
}

impl Lifecycle {
    /// Start in [`LifecycleState::Created`] with no surface
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            surface: SurfaceState::Absent,
            suspended: false,
        }
    }

    /// Current run state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Current surface state
    pub fn surface(&self) -> SurfaceState {
        self.surface
    }

    /// Whether rendering is suspended
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Apply a lifecycle signal
    ///
    /// Returns the previous state on success. On failure the state is unchanged.
    pub fn apply(&mut self, event: LifecycleEvent) -> BridgeResult<LifecycleState> {
        let operation = event.operation();
        self.require_alive(operation)?;

        let next = self.state.next(event).ok_or(BridgeError::NotReady {
            state: self.state,
            operation,
        })?;

        let previous = self.state;
        self.state = next;
        if next.is_destroyed() {
            self.surface = SurfaceState::Absent;
        }
        log::debug!("Lifecycle {previous} --{operation}--> {next}");
        Ok(previous)
    }

    /// Fail with [`BridgeError::InstanceDestroyed`] once torn down
    pub fn require_alive(&self, operation: &'static str) -> BridgeResult<()> {
        if self.state.is_destroyed() {
            Err(BridgeError::InstanceDestroyed { operation })
        } else {
            Ok(())
        }
    }

    /// Fail unless surface callbacks are accepted
    pub fn require_surface(&self, operation: &'static str) -> BridgeResult<()> {
        self.require(operation, LifecycleState::accepts_surface)
    }

    /// Fail unless input events are accepted
    pub fn require_input(&self, operation: &'static str) -> BridgeResult<()> {
        self.require(operation, LifecycleState::accepts_input)
    }

    /// Fail unless a frame may be drawn
    pub fn require_draw(&self, operation: &'static str) -> BridgeResult<()> {
        self.require(operation, LifecycleState::can_draw)
    }

    fn require(
        &self,
        operation: &'static str,
        allowed: fn(LifecycleState) -> bool,
    ) -> BridgeResult<()> {
        self.require_alive(operation)?;
        if allowed(self.state) {
            Ok(())
        } else {
            Err(BridgeError::NotReady {
                state: self.state,
                operation,
            })
        }
    }

    /// Record that the surface was created
    pub fn surface_created(&mut self) -> BridgeResult<()> {
        self.require_surface("surface_created")?;
        self.surface = SurfaceState::Created;
        Ok(())
    }

    /// Record a new surface size
    ///
    /// Returns `false` when the size is zero in either dimension; the
    /// surface collaborator reports a transient 0x0 during some transitions
    /// and those reports are not forwarded.
    pub fn surface_changed(&mut self, width: u32, height: u32) -> BridgeResult<bool> {
        self.require_surface("surface_changed")?;
        if width == 0 || height == 0 {
            log::warn!("Ignoring degenerate surface size {width}x{height}");
            return Ok(false);
        }
        self.surface = SurfaceState::Sized { width, height };
        Ok(true)
    }

    /// Record that the surface was destroyed
    pub fn surface_destroyed(&mut self) -> BridgeResult<()> {
        self.require_surface("surface_destroyed")?;
        self.surface = SurfaceState::Absent;
        Ok(())
    }

    /// Set the suspended flag
    ///
    /// Returns `true` if the flag changed.
    pub fn set_suspended(&mut self, suspended: bool) -> BridgeResult<bool> {
        self.require_alive("set_suspended")?;
        let changed = self.suspended != suspended;
        self.suspended = suspended;
        Ok(changed)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
