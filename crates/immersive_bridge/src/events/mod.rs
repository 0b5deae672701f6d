//! Discrete input events forwarded to the engine
//!
//! Hosts deliver input as raw integer codes; the `TryFrom<i32>` impls map
//! them onto typed actions at the boundary. [`dispatcher`] decides whether
//! an event reaches the engine.

pub mod dispatcher;

use thiserror::Error;

pub use dispatcher::{Dispatch, InputEvent};

/// Raw host code that does not name a known action
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unknown {kind} code {code}")]
pub struct EventCodeError {
    /// Which code table was consulted
    pub kind: &'static str,
    /// The rejected code
    pub code: i32,
}

macro_rules! raw_code_enum {
    (
        $(#[$meta:meta])* $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $code:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Raw host code
            pub fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl TryFrom<i32> for $name {
            type Error = EventCodeError;

            fn try_from(code: i32) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(EventCodeError { kind: $kind, code }),
                }
            }
        }
    };
}

raw_code_enum! {
    /// Touch phase
    TouchAction, "touch action" {
        /// Finger went down
        Down = 0,
        /// Finger lifted
        Up = 1,
        /// Finger moved while down
        Move = 2,
        /// Gesture was cancelled by the platform
        Cancel = 3,
    }
}

raw_code_enum! {
    /// Key phase
    KeyAction, "key action" {
        /// Key pressed
        Down = 0,
        /// Key released
        Up = 1,
    }
}

raw_code_enum! {
    /// Phase of a pinch or rotate gesture
    GestureState, "gesture state" {
        /// Gesture began
        Start = 1,
        /// Gesture updated
        Move = 2,
        /// Gesture ended
        End = 3,
    }
}

raw_code_enum! {
    /// Status of a click derived from touch input
    ClickState, "click state" {
        /// The button has gone down
        ClickDown = 1,
        /// The button has gone up
        ClickUp = 2,
        /// A down/up pair completed
        Clicked = 3,
    }
}

/// Touch at a viewport position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// Touch phase
    pub action: TouchAction,
    /// Viewport x in pixels
    pub x: f32,
    /// Viewport y in pixels
    pub y: f32,
}

/// Key press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Platform key code
    pub code: i32,
    /// Key phase
    pub action: KeyAction,
}

/// Two-finger pinch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchEvent {
    /// Gesture phase
    pub state: GestureState,
    /// Scale relative to the gesture start
    pub scale: f32,
    /// Viewport x of the pinch center
    pub x: f32,
    /// Viewport y of the pinch center
    pub y: f32,
}

/// Two-finger rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotateEvent {
    /// Gesture phase
    pub state: GestureState,
    /// Rotation relative to the gesture start, in radians
    pub radians: f32,
    /// Viewport x of the rotation center
    pub x: f32,
    /// Viewport y of the rotation center
    pub y: f32,
}
