//! Scene roots, nodes and the active-scene relationship

use std::time::Duration;

use super::Bridge;
use crate::backend::NativeRef;
use crate::engine::SceneBinding;
use crate::error::BridgeResult;
use crate::foundation::collections::{HandleRegistry, InstanceId, NodeHandle, SceneHandle};
use crate::scene::{SceneNode, SceneRoot, SceneTransitionManager};

impl Bridge {
    /// Register a scene root built by the scene-graph collaborator
    pub fn register_scene(&mut self, root: SceneRoot) -> SceneHandle {
        let name = root.name.clone();
        let handle = self.scenes.register(root);
        log::debug!("Registered scene '{name}' as {handle:?}");
        handle
    }

    /// Invalidate a scene root, detaching it from every instance first
    ///
    /// The record is handed back; the scene-graph collaborator still owns
    /// the native scene.
    pub fn release_scene(&mut self, scene: SceneHandle) -> BridgeResult<SceneRoot> {
        self.scenes.resolve(scene)?;
        let now = self.clock.now();

        for (id, instance) in self.instances.iter_mut() {
            if !instance.scenes.detach(scene) {
                continue;
            }
            log::debug!("Instance {id:?}: detached released scene {scene:?}");
            let binding = scene_binding(&self.scenes, &instance.scenes, now)?;
            if let Ok(engine) = instance.engine_mut("release_scene") {
                engine.set_scene(binding);
            }
        }

        self.scenes.invalidate(scene)
    }

    /// Look up a registered scene root
    pub fn scene(&self, scene: SceneHandle) -> BridgeResult<&SceneRoot> {
        self.scenes.resolve(scene)
    }

    /// Register a node that can anchor the camera
    pub fn register_node(&mut self, node: SceneNode) -> NodeHandle {
        let name = node.name.clone();
        let handle = self.nodes.register(node);
        log::debug!("Registered node '{name}' as {handle:?}");
        handle
    }

    /// Invalidate a node; instances viewing through it revert to the default camera
    pub fn release_node(&mut self, node: NodeHandle) -> BridgeResult<SceneNode> {
        self.nodes.resolve(node)?;

        for (id, instance) in self.instances.iter_mut() {
            if !instance.scenes.clear_point_of_view_if(node) {
                continue;
            }
            log::debug!("Instance {id:?}: point of view reverted to the default camera");
            if let Ok(engine) = instance.engine_mut("release_node") {
                engine.set_point_of_view(None);
            }
        }

        self.nodes.invalidate(node)
    }

    /// Swap the active scene immediately; `None` detaches without replacement
    ///
    /// A running transition is abandoned and its outgoing root detached.
    pub fn set_active_scene(
        &mut self,
        id: InstanceId,
        scene: Option<SceneHandle>,
    ) -> BridgeResult<()> {
        const OPERATION: &str = "set_active_scene";
        if let Some(scene) = scene {
            self.scenes.resolve(scene)?;
        }
        let now = self.clock.now();
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.require_alive(OPERATION)?;

        let detached = instance.scenes.set_immediate(scene);
        let binding = scene_binding(&self.scenes, &instance.scenes, now)?;
        instance.engine_mut(OPERATION)?.set_scene(binding);
        log::info!("Instance {id:?}: active scene {scene:?}, detached {detached:?}");
        Ok(())
    }

    /// Swap the active scene over `seconds` of wall-clock time
    ///
    /// Both roots stay renderable until the duration elapses; the outgoing
    /// root is detached by the first `draw_frame` after that. Durations are
    /// clamped to the configured maximum. A zero, negative or NaN duration
    /// is an immediate swap. A swap requested during a transition finishes
    /// the running transition first.
    pub fn set_active_scene_with_transition(
        &mut self,
        id: InstanceId,
        scene: SceneHandle,
        seconds: f32,
    ) -> BridgeResult<()> {
        const OPERATION: &str = "set_active_scene_with_transition";
        self.scenes.resolve(scene)?;
        let duration = self.transition_duration(seconds);
        let now = self.clock.now();
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.require_alive(OPERATION)?;

        instance.scenes.advance(now);
        let detached = instance.scenes.begin_transition(scene, duration, now);
        let binding = scene_binding(&self.scenes, &instance.scenes, now)?;
        instance.engine_mut(OPERATION)?.set_scene(binding);
        log::info!(
            "Instance {id:?}: transition to {scene:?} over {:.2}s, detached {detached:?}",
            duration.as_secs_f32()
        );
        Ok(())
    }

    fn transition_duration(&self, seconds: f32) -> Duration {
        let max = self.config.transition.max_duration_seconds;
        if seconds.is_nan() || seconds <= 0.0 {
            return Duration::ZERO;
        }
        if seconds > max {
            log::warn!("Clamping transition of {seconds}s to {max}s");
        }
        Duration::try_from_secs_f32(seconds.min(max)).unwrap_or(Duration::ZERO)
    }

    /// Root the instance is showing, or transitioning to
    pub fn active_scene(&self, id: InstanceId) -> BridgeResult<Option<SceneHandle>> {
        Ok(self.instances.resolve(id)?.scenes.active())
    }

    /// Roots currently eligible for rendering, outgoing first
    ///
    /// A transition whose duration has elapsed counts as finished even if
    /// no frame has been drawn since.
    pub fn renderable_scenes(&self, id: InstanceId) -> BridgeResult<Vec<SceneHandle>> {
        let now = self.clock.now();
        Ok(self.instances.resolve(id)?.scenes.renderable_at(now))
    }

    /// Whether a timed transition is still running
    pub fn is_transitioning(&self, id: InstanceId) -> BridgeResult<bool> {
        let now = self.clock.now();
        Ok(self.instances.resolve(id)?.scenes.is_transitioning_at(now))
    }

    /// Bind the camera to `node`, or to the engine's default camera
    pub fn set_point_of_view(
        &mut self,
        id: InstanceId,
        node: Option<NodeHandle>,
    ) -> BridgeResult<()> {
        const OPERATION: &str = "set_point_of_view";
        let native = node
            .map(|node| self.nodes.resolve(node).map(|record| record.native))
            .transpose()?;
        let instance = self.live_instance_mut(id, OPERATION)?;

        instance.scenes.set_point_of_view(node);
        instance.engine_mut(OPERATION)?.set_point_of_view(native);
        log::debug!("Instance {id:?}: point of view {node:?}");
        Ok(())
    }

    /// Node driving the camera, or `None` for the default camera
    pub fn point_of_view(&self, id: InstanceId) -> BridgeResult<Option<NodeHandle>> {
        Ok(self.instances.resolve(id)?.scenes.point_of_view())
    }
}

/// Engine-facing binding for the manager's current state
pub(super) fn scene_binding(
    scenes: &HandleRegistry<SceneHandle, SceneRoot>,
    manager: &SceneTransitionManager,
    now: Duration,
) -> BridgeResult<SceneBinding> {
    let Some(active) = manager.active() else {
        return Ok(SceneBinding::Detached);
    };
    let incoming = scenes.resolve(active)?.native;

    Ok(match manager.remaining(now) {
        Some(duration) => SceneBinding::Transition {
            outgoing: manager
                .outgoing()
                .map(|scene| scenes.resolve(scene).map(|root| root.native))
                .transpose()?,
            incoming,
            duration,
        },
        None => SceneBinding::Immediate { root: incoming },
    })
}

pub(super) fn native_roots(
    scenes: &HandleRegistry<SceneHandle, SceneRoot>,
    handles: &[SceneHandle],
) -> BridgeResult<Vec<NativeRef>> {
    handles
        .iter()
        .map(|scene| scenes.resolve(*scene).map(|root| root.native))
        .collect()
}

pub(super) fn point_of_view_native(
    nodes: &HandleRegistry<NodeHandle, SceneNode>,
    manager: &SceneTransitionManager,
) -> BridgeResult<Option<NativeRef>> {
    manager
        .point_of_view()
        .map(|node| nodes.resolve(node).map(|record| record.native))
        .transpose()
}
