//! Recording engine double and a bridge harness

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use crate::backend::{
    ActivityRef, ArSessionHandle, AssetSource, BackendKind, BackendSpec, DisplayInfo,
    HeadsetSdkContext, NativeRef, PlatformContext, SceneViewRef,
};
use crate::config::BridgeConfig;
use crate::engine::{EngineFault, EngineProvider, FrameContext, RenderEngine, SceneBinding};
use crate::events::{KeyEvent, PinchEvent, RotateEvent, TouchEvent};
use crate::foundation::time::ManualClock;
use crate::query::{HitResultKind, HitTestOutcome, HitTestQuery, HitTestResponder, HitTestResult};
use crate::foundation::math::{Mat4, Vec3};
use crate::{Bridge, BridgeResult, InstanceId};

/// Every call the bridge made on an engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    InitializeGraphics,
    Start,
    Pause,
    Resume,
    Stop,
    SurfaceCreated,
    SurfaceChanged(u32, u32),
    SurfaceDestroyed,
    Draw(FrameContext),
    Touch(TouchEvent),
    Key(KeyEvent),
    Pinch(PinchEvent),
    Rotate(RotateEvent),
    SetScene(SceneBinding),
    SetPointOfView(Option<NativeRef>),
    SetSuspended(bool),
    SetDebugHud(bool),
    SetVrMode(bool),
    Recenter,
    HitTest(HitTestQuery),
    Destroy,
}

/// How the recording engine answers hit tests
#[derive(Debug, Clone)]
pub enum HitScript {
    /// Complete right away with these results
    Respond(Vec<HitTestResult>),
    /// Keep the responder until the test releases it
    Hold,
    /// Drop the responder without completing it
    Drop,
}

/// Shared view of what the engines of one provider were asked to do
#[derive(Clone)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<EngineCall>>>,
    held: Rc<RefCell<Vec<HitTestResponder>>>,
    script: Rc<RefCell<HitScript>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            calls: Rc::default(),
            held: Rc::default(),
            script: Rc::new(RefCell::new(HitScript::Respond(Vec::new()))),
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, matches: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| matches(call)).count()
    }

    pub fn draws(&self) -> Vec<FrameContext> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                EngineCall::Draw(frame) => Some(frame.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_scene(&self) -> Option<SceneBinding> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            EngineCall::SetScene(binding) => Some(*binding),
            _ => None,
        })
    }

    pub fn script(&self, script: HitScript) {
        *self.script.borrow_mut() = script;
    }

    pub fn take_held(&self) -> Vec<HitTestResponder> {
        self.held.borrow_mut().drain(..).collect()
    }

    fn record(&self, call: EngineCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Engine double that records calls and answers hit tests from a script
pub struct RecordingEngine {
    recorder: Recorder,
}

impl RenderEngine for RecordingEngine {
    fn initialize_graphics(&mut self) {
        self.recorder.record(EngineCall::InitializeGraphics);
    }

    fn on_start(&mut self) {
        self.recorder.record(EngineCall::Start);
    }

    fn on_pause(&mut self) {
        self.recorder.record(EngineCall::Pause);
    }

    fn on_resume(&mut self) {
        self.recorder.record(EngineCall::Resume);
    }

    fn on_stop(&mut self) {
        self.recorder.record(EngineCall::Stop);
    }

    fn on_surface_created(&mut self) {
        self.recorder.record(EngineCall::SurfaceCreated);
    }

    fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.recorder.record(EngineCall::SurfaceChanged(width, height));
    }

    fn on_surface_destroyed(&mut self) {
        self.recorder.record(EngineCall::SurfaceDestroyed);
    }

    fn draw_frame(&mut self, frame: &FrameContext) {
        self.recorder.record(EngineCall::Draw(frame.clone()));
    }

    fn on_touch(&mut self, event: TouchEvent) {
        self.recorder.record(EngineCall::Touch(event));
    }

    fn on_key(&mut self, event: KeyEvent) {
        self.recorder.record(EngineCall::Key(event));
    }

    fn on_pinch(&mut self, event: PinchEvent) {
        self.recorder.record(EngineCall::Pinch(event));
    }

    fn on_rotate(&mut self, event: RotateEvent) {
        self.recorder.record(EngineCall::Rotate(event));
    }

    fn set_scene(&mut self, binding: SceneBinding) {
        self.recorder.record(EngineCall::SetScene(binding));
    }

    fn set_point_of_view(&mut self, node: Option<NativeRef>) {
        self.recorder.record(EngineCall::SetPointOfView(node));
    }

    fn set_suspended(&mut self, suspended: bool) {
        self.recorder.record(EngineCall::SetSuspended(suspended));
    }

    fn set_debug_hud(&mut self, enabled: bool) {
        self.recorder.record(EngineCall::SetDebugHud(enabled));
    }

    fn set_vr_mode(&mut self, enabled: bool) {
        self.recorder.record(EngineCall::SetVrMode(enabled));
    }

    fn recenter_tracking(&mut self) {
        self.recorder.record(EngineCall::Recenter);
    }

    fn headset_name(&self) -> String {
        "recording-headset".to_string()
    }

    fn controller_name(&self) -> String {
        "recording-controller".to_string()
    }

    fn hit_test(&mut self, query: HitTestQuery, responder: HitTestResponder) {
        self.recorder.record(EngineCall::HitTest(query));
        let script = self.recorder.script.borrow().clone();
        match script {
            HitScript::Respond(results) => responder.succeed(results),
            HitScript::Hold => self.recorder.held.borrow_mut().push(responder),
            HitScript::Drop => drop(responder),
        }
    }

    fn destroy(&mut self) {
        self.recorder.record(EngineCall::Destroy);
    }
}

/// Provider handing out recording engines, or failing on request
pub struct RecordingProvider {
    recorder: Recorder,
    fault: Option<String>,
}

impl RecordingProvider {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder, fault: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            recorder: Recorder::new(),
            fault: Some(reason.to_string()),
        }
    }
}

impl EngineProvider for RecordingProvider {
    fn spawn(&self, _spec: &BackendSpec) -> Result<Box<dyn RenderEngine>, EngineFault> {
        match &self.fault {
            Some(reason) => Err(EngineFault(reason.clone())),
            None => Ok(Box::new(RecordingEngine {
                recorder: self.recorder.clone(),
            })),
        }
    }
}

pub fn platform(recorder: &Recorder) -> PlatformContext {
    PlatformContext::new(
        DisplayInfo::new(1920, 1080, 2.0),
        Rc::new(RecordingProvider::new(recorder.clone())),
    )
}

pub fn assets() -> AssetSource {
    AssetSource::new("assets")
}

/// Construct an instance of `kind` with non-null native inputs
pub fn create(
    bridge: &mut Bridge,
    platform: &PlatformContext,
    kind: BackendKind,
) -> BridgeResult<InstanceId> {
    match kind {
        BackendKind::HeadsetSdk => bridge.create_headset_sdk(
            platform,
            assets(),
            HeadsetSdkContext {
                native: NativeRef(10),
            },
        ),
        BackendKind::StandaloneHeadset => bridge.create_standalone_headset(
            platform,
            assets(),
            ActivityRef {
                activity: NativeRef(20),
                view: NativeRef(21),
            },
        ),
        BackendKind::ArSession => bridge.create_ar_session(
            platform,
            assets(),
            ArSessionHandle {
                session: NativeRef(30),
                view: NativeRef(31),
            },
        ),
        BackendKind::EmbeddedSceneView => {
            bridge.create_scene_view(platform, assets(), SceneViewRef { view: NativeRef(40) })
        }
    }
}

/// Bridge on a manual clock with one recording provider
pub struct Harness {
    pub bridge: Bridge,
    pub clock: ManualClock,
    pub recorder: Recorder,
    pub platform: PlatformContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let clock = ManualClock::new();
        let recorder = Recorder::new();
        Self {
            bridge: Bridge::with_clock(config, clock.clone()),
            clock,
            platform: platform(&recorder),
            recorder,
        }
    }

    pub fn create(&mut self, kind: BackendKind) -> InstanceId {
        create(&mut self.bridge, &self.platform, kind).unwrap()
    }

    /// Instance of `kind` taken through `initialize_graphics_context` and `start`
    pub fn started(&mut self, kind: BackendKind) -> InstanceId {
        let id = self.create(kind);
        self.bridge.initialize_graphics_context(id).unwrap();
        self.bridge.start(id).unwrap();
        id
    }
}

/// Completion log shared with handlers that may run on any thread
pub type Outcomes = Arc<Mutex<Vec<HitTestOutcome>>>;

pub fn recording_handler(outcomes: &Outcomes) -> impl FnOnce(HitTestOutcome) + Send + 'static {
    let outcomes = Arc::clone(outcomes);
    move |outcome| outcomes.lock().unwrap().push(outcome)
}

pub fn hit_at(distance: f32) -> HitTestResult {
    HitTestResult {
        kind: HitResultKind::ExistingPlaneUsingExtent,
        distance,
        world_transform: Mat4::new_translation(&Vec3::new(0.0, 0.0, -distance)),
        local_transform: Mat4::identity(),
    }
}
