//! Per-instance state owned by the bridge

use crate::backend::BackendKind;
use crate::backend::selector::SelectedBackend;
use crate::engine::RenderEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::frame::FrameListenerSet;
use crate::lifecycle::Lifecycle;
use crate::scene::SceneTransitionManager;

/// One rendering engine bound to a surface and a backend
///
/// The engine is held until `destroy`; afterwards the record stays behind
/// so that later calls report [`BridgeError::InstanceDestroyed`] until the
/// identity is released.
pub(crate) struct EngineInstance {
    pub backend: BackendKind,
    pub lifecycle: Lifecycle,
    pub scenes: SceneTransitionManager,
    pub listeners: FrameListenerSet,
    pub debug_hud: bool,
    pub vr_mode: bool,
    pub frame_number: u64,
    engine: Option<Box<dyn RenderEngine>>,
}

impl EngineInstance {
    pub fn new(selected: SelectedBackend) -> Self {
        let SelectedBackend { spec, engine } = selected;
        Self {
            backend: spec.kind(),
            lifecycle: Lifecycle::new(),
            scenes: SceneTransitionManager::new(),
            listeners: FrameListenerSet::new(),
            debug_hud: false,
            vr_mode: true,
            frame_number: 0,
            engine: Some(engine),
        }
    }

    /// Engine for `operation`, or `InstanceDestroyed` once released
    pub fn engine_mut(
        &mut self,
        operation: &'static str,
    ) -> BridgeResult<&mut Box<dyn RenderEngine>> {
        self.engine
            .as_mut()
            .ok_or(BridgeError::InstanceDestroyed { operation })
    }

    pub fn engine(&self, operation: &'static str) -> BridgeResult<&dyn RenderEngine> {
        self.engine
            .as_deref()
            .ok_or(BridgeError::InstanceDestroyed { operation })
    }

    pub fn take_engine(&mut self) -> Option<Box<dyn RenderEngine>> {
        self.engine.take()
    }
}
