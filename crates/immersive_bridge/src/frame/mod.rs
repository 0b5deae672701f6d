//! Per-frame callback hooks
//!
//! Listeners are registered once with the bridge and then attached to any
//! number of engine instances. Each instance keeps its attachments in a
//! [`FrameListenerSet`]; attaching twice is idempotent and invocation
//! follows attachment order.

use std::time::Duration;

use indexmap::IndexSet;

use crate::foundation::collections::{InstanceId, ListenerHandle};

/// Information passed to a listener for each rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    /// Instance that drew the frame
    pub instance: InstanceId,
    /// Frame counter of that instance
    pub frame_number: u64,
    /// Bridge clock at the start of the frame
    pub timestamp: Duration,
}

/// Hook invoked once per rendered frame
pub trait FrameListener {
    /// Called after the engine drew the frame
    fn on_frame(&mut self, frame: &FrameInfo);
}

impl<F> FrameListener for F
where
    F: FnMut(&FrameInfo),
{
    fn on_frame(&mut self, frame: &FrameInfo) {
        self(frame);
    }
}

/// Listeners attached to one instance, in attachment order
#[derive(Debug, Clone, Default)]
pub struct FrameListenerSet {
    listeners: IndexSet<ListenerHandle>,
}

impl FrameListenerSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener`; returns `false` if it was already attached
    pub fn add(&mut self, listener: ListenerHandle) -> bool {
        self.listeners.insert(listener)
    }

    /// Detach `listener`; returns `false` if it was not attached
    pub fn remove(&mut self, listener: ListenerHandle) -> bool {
        self.listeners.shift_remove(&listener)
    }

    /// Whether `listener` is attached
    pub fn contains(&self, listener: ListenerHandle) -> bool {
        self.listeners.contains(&listener)
    }

    /// Copy of the current attachments for one frame's dispatch
    pub fn snapshot(&self) -> Vec<ListenerHandle> {
        self.listeners.iter().copied().collect()
    }

    /// Number of attached listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is attached
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Detach everything
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
