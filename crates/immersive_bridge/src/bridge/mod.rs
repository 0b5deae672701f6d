//! Host-facing façade
//!
//! [`Bridge`] owns every engine instance it constructs together with the
//! identity registries for scene roots, nodes and frame listeners. All
//! calls are expected from one designated thread; the bridge does no
//! internal locking. Identities are only meaningful to the bridge that
//! issued them.
//!
//! Operations are grouped by concern:
//! - construction, lifecycle, surface and device calls (this module)
//! - input and frame dispatch ([`frames`])
//! - active scene and camera anchor ([`scenes`])
//! - spatial queries ([`queries`])

mod frames;
mod queries;
mod scenes;

pub use frames::FrameReport;

use crate::backend::selector;
use crate::backend::{
    ActivityRef, ArSessionHandle, AssetSource, BackendKind, BackendVariant, Capabilities,
    HeadsetSdkContext, PlatformContext, SceneViewRef,
};
use crate::config::BridgeConfig;
use crate::engine::RenderEngine;
use crate::error::BridgeResult;
use crate::foundation::collections::{
    HandleKind, HandleRegistry, InstanceId, ListenerHandle, NodeHandle, SceneHandle,
};
use crate::foundation::time::{Clock, SystemClock};
use crate::frame::FrameListener;
use crate::instance::EngineInstance;
use crate::lifecycle::{LifecycleEvent, LifecycleState, SurfaceState};
use crate::query::QueryBridge;
use crate::scene::{SceneNode, SceneRoot};

/// Lifecycle and event bridge between a host and its rendering engines
pub struct Bridge {
    config: BridgeConfig,
    clock: Box<dyn Clock>,
    instances: HandleRegistry<InstanceId, EngineInstance>,
    scenes: HandleRegistry<SceneHandle, SceneRoot>,
    nodes: HandleRegistry<NodeHandle, SceneNode>,
    listeners: HandleRegistry<ListenerHandle, Box<dyn FrameListener>>,
    queries: QueryBridge,
}

impl Bridge {
    /// Create a bridge reading time from the system monotonic clock
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }

    /// Create a bridge reading time from `clock`
    pub fn with_clock(config: BridgeConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
            instances: HandleRegistry::new(HandleKind::Instance),
            scenes: HandleRegistry::new(HandleKind::Scene),
            nodes: HandleRegistry::new(HandleKind::Node),
            listeners: HandleRegistry::new(HandleKind::FrameListener),
            queries: QueryBridge::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Number of instances whose identity has not been released
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    // ----- Construction -----

    /// Construct an engine backed by a headset SDK session
    pub fn create_headset_sdk(
        &mut self,
        platform: &PlatformContext,
        assets: AssetSource,
        context: HeadsetSdkContext,
    ) -> BridgeResult<InstanceId> {
        self.create(platform, assets, BackendVariant::HeadsetSdk(context))
    }

    /// Construct an engine for a standalone headset activity
    pub fn create_standalone_headset(
        &mut self,
        platform: &PlatformContext,
        assets: AssetSource,
        activity: ActivityRef,
    ) -> BridgeResult<InstanceId> {
        self.create(platform, assets, BackendVariant::StandaloneHeadset(activity))
    }

    /// Construct an engine rendering into an AR session
    pub fn create_ar_session(
        &mut self,
        platform: &PlatformContext,
        assets: AssetSource,
        session: ArSessionHandle,
    ) -> BridgeResult<InstanceId> {
        self.create(platform, assets, BackendVariant::ArSession(session))
    }

    /// Construct an engine embedded in a plain scene view
    pub fn create_scene_view(
        &mut self,
        platform: &PlatformContext,
        assets: AssetSource,
        view: SceneViewRef,
    ) -> BridgeResult<InstanceId> {
        self.create(platform, assets, BackendVariant::EmbeddedSceneView(view))
    }

    fn create(
        &mut self,
        platform: &PlatformContext,
        assets: AssetSource,
        variant: BackendVariant,
    ) -> BridgeResult<InstanceId> {
        let selected = selector::construct(platform, assets, variant)?;
        let mut instance = EngineInstance::new(selected);
        if self.config.debug_hud {
            instance.debug_hud = true;
            instance.engine_mut("set_debug_hud")?.set_debug_hud(true);
        }

        let backend = instance.backend;
        let id = self.instances.register(instance);
        log::info!("Registered {backend} instance {id:?}");
        Ok(id)
    }

    // ----- Lifecycle -----

    /// `Created -> GlReady`
    pub fn initialize_graphics_context(&mut self, id: InstanceId) -> BridgeResult<()> {
        self.transition(id, LifecycleEvent::InitializeGraphics, |engine| {
            engine.initialize_graphics();
        })
    }

    /// `GlReady | Stopped -> Started`
    pub fn start(&mut self, id: InstanceId) -> BridgeResult<()> {
        self.transition(id, LifecycleEvent::Start, |engine| engine.on_start())
    }

    /// `Started -> Paused`
    pub fn pause(&mut self, id: InstanceId) -> BridgeResult<()> {
        self.transition(id, LifecycleEvent::Pause, |engine| engine.on_pause())
    }

    /// `Paused -> Started`
    pub fn resume(&mut self, id: InstanceId) -> BridgeResult<()> {
        self.transition(id, LifecycleEvent::Resume, |engine| engine.on_resume())
    }

    /// `Started | Paused -> Stopped`
    pub fn stop(&mut self, id: InstanceId) -> BridgeResult<()> {
        self.transition(id, LifecycleEvent::Stop, |engine| engine.on_stop())
    }

    /// Apply a non-terminal lifecycle event and forward it to the engine
    fn transition(
        &mut self,
        id: InstanceId,
        event: LifecycleEvent,
        forward: impl FnOnce(&mut dyn RenderEngine),
    ) -> BridgeResult<()> {
        let instance = self.instances.resolve_mut(id)?;
        let previous = instance.lifecycle.apply(event)?;
        forward(&mut **instance.engine_mut(event.operation())?);
        log::info!(
            "Instance {id:?}: {previous} -> {}",
            instance.lifecycle.state()
        );
        Ok(())
    }

    /// Tear the instance down
    ///
    /// Outstanding queries are completed with
    /// [`QueryFailure::Cancelled`](crate::query::QueryFailure::Cancelled)
    /// before the engine is released. The identity stays resolvable, and
    /// every later call on it fails with
    /// [`BridgeError::InstanceDestroyed`](crate::BridgeError::InstanceDestroyed),
    /// until [`Bridge::release_instance`] is called.
    pub fn destroy(&mut self, id: InstanceId) -> BridgeResult<()> {
        let instance = self.instances.resolve_mut(id)?;
        let previous = instance.lifecycle.apply(LifecycleEvent::Destroy)?;

        let cancelled = self.queries.cancel_instance(id);
        instance.scenes.clear();
        instance.listeners.clear();
        if let Some(mut engine) = instance.take_engine() {
            engine.destroy();
        }

        log::info!(
            "Instance {id:?}: {previous} -> {} ({cancelled} queries cancelled)",
            LifecycleState::Destroyed
        );
        Ok(())
    }

    /// Invalidate the instance identity, destroying the instance first if needed
    pub fn release_instance(&mut self, id: InstanceId) -> BridgeResult<()> {
        if !self.instances.resolve(id)?.lifecycle.state().is_destroyed() {
            self.destroy(id)?;
        }
        self.instances.invalidate(id)?;
        log::debug!("Released instance {id:?}");
        Ok(())
    }

    // ----- Surface -----

    /// The display surface was created
    pub fn surface_created(&mut self, id: InstanceId) -> BridgeResult<()> {
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.surface_created()?;
        instance.engine_mut("surface_created")?.on_surface_created();
        Ok(())
    }

    /// The display surface changed size
    ///
    /// A zero size in either dimension is logged and not forwarded.
    pub fn surface_changed(&mut self, id: InstanceId, width: u32, height: u32) -> BridgeResult<()> {
        let instance = self.instances.resolve_mut(id)?;
        if instance.lifecycle.surface_changed(width, height)? {
            instance
                .engine_mut("surface_changed")?
                .on_surface_changed(width, height);
        }
        Ok(())
    }

    /// The display surface was destroyed
    pub fn surface_destroyed(&mut self, id: InstanceId) -> BridgeResult<()> {
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.surface_destroyed()?;
        instance.engine_mut("surface_destroyed")?.on_surface_destroyed();
        Ok(())
    }

    // ----- Flags and devices -----

    /// Pause or resume rendering without a lifecycle transition
    pub fn set_suspended(&mut self, id: InstanceId, suspended: bool) -> BridgeResult<()> {
        let instance = self.instances.resolve_mut(id)?;
        if instance.lifecycle.set_suspended(suspended)? {
            instance.engine_mut("set_suspended")?.set_suspended(suspended);
            log::debug!("Instance {id:?} suspended = {suspended}");
        }
        Ok(())
    }

    /// Show or hide the engine's debug overlay
    pub fn set_debug_hud(&mut self, id: InstanceId, enabled: bool) -> BridgeResult<()> {
        let instance = self.live_instance_mut(id, "set_debug_hud")?;
        instance.debug_hud = enabled;
        instance.engine_mut("set_debug_hud")?.set_debug_hud(enabled);
        Ok(())
    }

    /// Switch stereo presentation on or off (headset SDK backends)
    pub fn set_vr_mode_enabled(&mut self, id: InstanceId, enabled: bool) -> BridgeResult<()> {
        const OPERATION: &str = "set_vr_mode_enabled";
        let instance = self.live_instance_mut(id, OPERATION)?;
        instance.backend.require(Capabilities::VR_MODE_TOGGLE, OPERATION)?;
        instance.vr_mode = enabled;
        instance.engine_mut(OPERATION)?.set_vr_mode(enabled);
        log::debug!("Instance {id:?} VR mode = {enabled}");
        Ok(())
    }

    /// Reset the tracked forward direction (standalone headset backends)
    pub fn recenter_tracking(&mut self, id: InstanceId) -> BridgeResult<()> {
        const OPERATION: &str = "recenter_tracking";
        let instance = self.live_instance_mut(id, OPERATION)?;
        instance.backend.require(Capabilities::RECENTER_TRACKING, OPERATION)?;
        instance.engine_mut(OPERATION)?.recenter_tracking();
        Ok(())
    }

    /// Name of the headset the engine is presenting to
    pub fn headset_name(&self, id: InstanceId) -> BridgeResult<String> {
        Ok(self.instances.resolve(id)?.engine("headset_name")?.headset_name())
    }

    /// Name of the controller the engine is reading
    pub fn controller_name(&self, id: InstanceId) -> BridgeResult<String> {
        Ok(self
            .instances
            .resolve(id)?
            .engine("controller_name")?
            .controller_name())
    }

    // ----- State accessors -----

    /// Backend the instance was constructed for
    pub fn backend(&self, id: InstanceId) -> BridgeResult<BackendKind> {
        Ok(self.instances.resolve(id)?.backend)
    }

    /// Current lifecycle state; reports `Destroyed` until the identity is released
    pub fn state(&self, id: InstanceId) -> BridgeResult<LifecycleState> {
        Ok(self.instances.resolve(id)?.lifecycle.state())
    }

    /// Last reported display surface
    pub fn surface(&self, id: InstanceId) -> BridgeResult<SurfaceState> {
        Ok(self.instances.resolve(id)?.lifecycle.surface())
    }

    /// Whether rendering is suspended
    pub fn is_suspended(&self, id: InstanceId) -> BridgeResult<bool> {
        Ok(self.instances.resolve(id)?.lifecycle.is_suspended())
    }

    /// Whether the debug overlay is shown
    pub fn debug_hud_enabled(&self, id: InstanceId) -> BridgeResult<bool> {
        Ok(self.instances.resolve(id)?.debug_hud)
    }

    /// Whether stereo presentation is on
    pub fn vr_mode_enabled(&self, id: InstanceId) -> BridgeResult<bool> {
        Ok(self.instances.resolve(id)?.vr_mode)
    }

    fn live_instance_mut(
        &mut self,
        id: InstanceId,
        operation: &'static str,
    ) -> BridgeResult<&mut EngineInstance> {
        let instance = self.instances.resolve_mut(id)?;
        instance.lifecycle.require_alive(operation)?;
        Ok(instance)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        let live: Vec<InstanceId> = self
            .instances
            .iter()
            .filter(|(_, instance)| !instance.lifecycle.state().is_destroyed())
            .map(|(id, _)| id)
            .collect();

        for id in live {
            if let Err(err) = self.destroy(id) {
                log::warn!("Failed to tear down instance {id:?}: {err}");
            }
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("instances", &self.instances)
            .field("scenes", &self.scenes)
            .field("nodes", &self.nodes)
            .field("listeners", &self.listeners)
            .field("pending_queries", &self.queries.pending())
            .finish_non_exhaustive()
    }
}
