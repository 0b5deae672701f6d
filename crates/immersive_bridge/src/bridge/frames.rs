//! Input dispatch, frame drawing and frame listeners

use super::scenes::{native_roots, point_of_view_native, scene_binding};
use super::Bridge;
use crate::engine::FrameContext;
use crate::error::BridgeResult;
use crate::events::dispatcher;
use crate::events::{Dispatch, InputEvent, KeyEvent, PinchEvent, RotateEvent, TouchEvent};
use crate::foundation::collections::{InstanceId, ListenerHandle, SceneHandle};
use crate::frame::{FrameInfo, FrameListener};

/// What happened during one `draw_frame` call
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Number of the frame drawn, or of the last drawn frame when skipped
    pub frame_number: u64,
    /// Whether the frame was skipped because rendering is suspended
    pub skipped: bool,
    /// Roots that were eligible for rendering, outgoing first
    pub renderable: Vec<SceneHandle>,
    /// Progress of the running transition
    pub transition_progress: Option<f32>,
    /// Frame listeners invoked
    pub listeners_notified: usize,
    /// Query completions delivered after the frame
    pub completions_delivered: usize,
}

impl Bridge {
    /// Forward a touch event
    pub fn dispatch_touch(&mut self, id: InstanceId, event: TouchEvent) -> BridgeResult<Dispatch> {
        self.dispatch_input(id, InputEvent::Touch(event))
    }

    /// Forward a key event
    pub fn dispatch_key(&mut self, id: InstanceId, event: KeyEvent) -> BridgeResult<Dispatch> {
        self.dispatch_input(id, InputEvent::Key(event))
    }

    /// Forward a pinch gesture; ignored on backends without gesture tracking
    pub fn dispatch_pinch(&mut self, id: InstanceId, event: PinchEvent) -> BridgeResult<Dispatch> {
        self.dispatch_input(id, InputEvent::Pinch(event))
    }

    /// Forward a rotate gesture; ignored on backends without gesture tracking
    pub fn dispatch_rotate(
        &mut self,
        id: InstanceId,
        event: RotateEvent,
    ) -> BridgeResult<Dispatch> {
        self.dispatch_input(id, InputEvent::Rotate(event))
    }

    /// Forward any input event
    pub fn dispatch_input(&mut self, id: InstanceId, event: InputEvent) -> BridgeResult<Dispatch> {
        dispatcher::dispatch(self.instances.resolve_mut(id)?, event)
    }

    /// Draw one frame
    ///
    /// Requires the instance to be `Started`. A finished transition detaches
    /// its outgoing root before the frame is built. While suspended the
    /// frame is skipped: neither the engine nor the listeners are called.
    /// Otherwise the engine draws, the listeners attached at the start of
    /// the frame are invoked in attachment order, and up to
    /// `completion_budget` query completions are delivered.
    pub fn draw_frame(&mut self, id: InstanceId) -> BridgeResult<FrameReport> {
        const OPERATION: &str = "draw_frame";
        let now = self.clock.now();
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.require_draw(OPERATION)?;

        if let Some(completed) = instance.scenes.advance(now) {
            log::debug!(
                "Instance {id:?}: transition to {:?} finished, detached {:?}",
                completed.active,
                completed.detached
            );
            let binding = scene_binding(&self.scenes, &instance.scenes, now)?;
            instance.engine_mut(OPERATION)?.set_scene(binding);
        }

        let renderable = instance.scenes.renderable();
        let transition_progress = instance.scenes.progress(now);

        if instance.lifecycle.is_suspended() {
            log::trace!("Instance {id:?}: frame skipped while suspended");
            return Ok(FrameReport {
                frame_number: instance.frame_number,
                skipped: true,
                renderable,
                transition_progress,
                listeners_notified: 0,
                completions_delivered: 0,
            });
        }

        let frame = FrameContext {
            frame_number: instance.frame_number + 1,
            timestamp: now,
            renderable: native_roots(&self.scenes, &renderable)?,
            transition_progress,
            point_of_view: point_of_view_native(&self.nodes, &instance.scenes)?,
        };
        instance.engine_mut(OPERATION)?.draw_frame(&frame);
        instance.frame_number = frame.frame_number;

        let info = FrameInfo {
            instance: id,
            frame_number: frame.frame_number,
            timestamp: now,
        };
        let mut listeners_notified = 0;
        for handle in instance.listeners.snapshot() {
            if let Ok(listener) = self.listeners.resolve_mut(handle) {
                listener.on_frame(&info);
                listeners_notified += 1;
            }
        }

        let completions_delivered = self.queries.drain(self.config.completion_budget);

        Ok(FrameReport {
            frame_number: frame.frame_number,
            skipped: false,
            renderable,
            transition_progress,
            listeners_notified,
            completions_delivered,
        })
    }

    /// Register a frame listener with the bridge
    ///
    /// The listener runs only for instances it is attached to with
    /// [`Bridge::add_frame_listener`].
    pub fn register_frame_listener(
        &mut self,
        listener: impl FrameListener + 'static,
    ) -> ListenerHandle {
        let handle = self.listeners.register(Box::new(listener));
        log::debug!("Registered frame listener {handle:?}");
        handle
    }

    /// Detach the listener from every instance and invalidate its identity
    pub fn release_frame_listener(&mut self, listener: ListenerHandle) -> BridgeResult<()> {
        self.listeners.invalidate(listener)?;
        for (_, instance) in self.instances.iter_mut() {
            instance.listeners.remove(listener);
        }
        log::debug!("Released frame listener {listener:?}");
        Ok(())
    }

    /// Attach a registered listener to an instance
    ///
    /// Attaching a listener that is already attached changes nothing.
    pub fn add_frame_listener(
        &mut self,
        id: InstanceId,
        listener: ListenerHandle,
    ) -> BridgeResult<()> {
        self.listeners.resolve(listener)?;
        let instance = self.live_instance_mut(id, "add_frame_listener")?;
        if instance.listeners.add(listener) {
            log::debug!("Instance {id:?}: attached frame listener {listener:?}");
        }
        Ok(())
    }

    /// Detach a listener from an instance
    ///
    /// Detaching a listener that is not attached, or was never registered,
    /// is a no-op. Once this returns the listener is not invoked for that
    /// instance again.
    pub fn remove_frame_listener(
        &mut self,
        id: InstanceId,
        listener: ListenerHandle,
    ) -> BridgeResult<()> {
        let instance = self.live_instance_mut(id, "remove_frame_listener")?;
        if instance.listeners.remove(listener) {
            log::debug!("Instance {id:?}: detached frame listener {listener:?}");
        }
        Ok(())
    }

    /// Number of listeners attached to an instance
    pub fn frame_listener_count(&self, id: InstanceId) -> BridgeResult<usize> {
        Ok(self.instances.resolve(id)?.listeners.len())
    }
}
