//! Input forwarding with lifecycle and capability checks
//!
//! Input is accepted while the instance is `Started` or `Paused`. Pinch and
//! rotate are forwarded only to backends with gesture tracking; elsewhere
//! they are dropped as [`Dispatch::Ignored`], which is not an error because
//! the gesture hardware may simply be absent.

use super::{KeyEvent, PinchEvent, RotateEvent, TouchEvent};
use crate::backend::Capabilities;
use crate::error::BridgeResult;
use crate::instance::EngineInstance;

/// Any discrete input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Touch input
    Touch(TouchEvent),
    /// Key input
    Key(KeyEvent),
    /// Pinch gesture
    Pinch(PinchEvent),
    /// Rotate gesture
    Rotate(RotateEvent),
}

impl InputEvent {
    /// Operation name used in errors and logs
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Touch(_) => "dispatch_touch",
            Self::Key(_) => "dispatch_key",
            Self::Pinch(_) => "dispatch_pinch",
            Self::Rotate(_) => "dispatch_rotate",
        }
    }

    /// Whether the event needs gesture tracking
    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::Pinch(_) | Self::Rotate(_))
    }
}

/// What happened to a dispatched event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The engine received the event
    Delivered,
    /// The backend has no use for the event and it was dropped
    Ignored,
}

/// Forward `event` to the instance's engine
pub(crate) fn dispatch(instance: &mut EngineInstance, event: InputEvent) -> BridgeResult<Dispatch> {
    let operation = event.operation();
    instance.lifecycle.require_input(operation)?;

    if event.is_gesture() && !instance.backend.supports(Capabilities::GESTURES) {
        log::trace!("{operation} ignored: {} has no gesture tracking", instance.backend);
        return Ok(Dispatch::Ignored);
    }

    let engine = instance.engine_mut(operation)?;
    match event {
        InputEvent::Touch(touch) => engine.on_touch(touch),
        InputEvent::Key(key) => engine.on_key(key),
        InputEvent::Pinch(pinch) => engine.on_pinch(pinch),
        InputEvent::Rotate(rotate) => engine.on_rotate(rotate),
    }
    Ok(Dispatch::Delivered)
}
