//! Lifecycle ordering, gating and teardown

use super::support::{create, EngineCall, Harness, Recorder, RecordingProvider};
use crate::backend::{ArSessionHandle, BackendKind, DisplayInfo, NativeRef, PlatformContext};
use crate::config::BridgeConfig;
use crate::events::{
    Dispatch, GestureState, KeyAction, KeyEvent, PinchEvent, RotateEvent, TouchAction, TouchEvent,
};
use crate::foundation::collections::HandleKind;
use crate::lifecycle::{LifecycleState, SurfaceState};
use crate::{Bridge, BridgeError, BridgeResult, InstanceId};
use std::rc::Rc;

fn destroyed<T>(operation: &'static str) -> BridgeResult<T> {
    Err(BridgeError::InstanceDestroyed { operation })
}

fn touch(action: TouchAction) -> TouchEvent {
    TouchEvent { action, x: 10.0, y: 20.0 }
}

fn pinch() -> PinchEvent {
    PinchEvent {
        state: GestureState::Start,
        scale: 1.5,
        x: 0.0,
        y: 0.0,
    }
}

#[test]
fn test_legal_sequence_follows_state_table() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::EmbeddedSceneView);
    assert_eq!(h.bridge.state(id), Ok(LifecycleState::Created));

    type Step = fn(&mut Bridge, InstanceId) -> BridgeResult<()>;
    let steps: [(Step, LifecycleState); 7] = [
        (Bridge::initialize_graphics_context, LifecycleState::GlReady),
        (Bridge::start, LifecycleState::Started),
        (Bridge::pause, LifecycleState::Paused),
        (Bridge::resume, LifecycleState::Started),
        (Bridge::stop, LifecycleState::Stopped),
        (Bridge::start, LifecycleState::Started),
        (Bridge::destroy, LifecycleState::Destroyed),
    ];
    for (step, expected) in steps {
        step(&mut h.bridge, id).unwrap();
        assert_eq!(h.bridge.state(id), Ok(expected));
    }

    assert_eq!(
        h.recorder.calls(),
        vec![
            EngineCall::InitializeGraphics,
            EngineCall::Start,
            EngineCall::Pause,
            EngineCall::Resume,
            EngineCall::Stop,
            EngineCall::Start,
            EngineCall::Destroy,
        ]
    );

    assert!(h.bridge.destroy(id).is_err());
    assert!(h.bridge.start(id).is_err());
    assert_eq!(h.recorder.count(|call| *call == EngineCall::Destroy), 1);
    assert_eq!(h.recorder.calls().len(), 7);
}

#[test]
fn test_draw_before_initialize_is_not_ready() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::ArSession);

    assert_eq!(
        h.bridge.draw_frame(id),
        Err(BridgeError::NotReady {
            state: LifecycleState::Created,
            operation: "draw_frame",
        })
    );
    assert_eq!(h.bridge.state(id), Ok(LifecycleState::Created));
    assert!(h.recorder.draws().is_empty());
}

#[test]
fn test_draw_requires_started() {
    let mut h = Harness::new();
    let id = h.started(BackendKind::ArSession);
    h.bridge.pause(id).unwrap();

    assert!(matches!(
        h.bridge.draw_frame(id),
        Err(BridgeError::NotReady {
            state: LifecycleState::Paused,
            ..
        })
    ));
    h.bridge.resume(id).unwrap();
    assert_eq!(h.bridge.draw_frame(id).unwrap().frame_number, 1);
}

#[test]
fn test_illegal_transitions_leave_state_unchanged() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::HeadsetSdk);

    assert!(matches!(h.bridge.start(id), Err(BridgeError::NotReady { .. })));
    assert_eq!(h.bridge.state(id), Ok(LifecycleState::Created));

    h.bridge.initialize_graphics_context(id).unwrap();
    assert!(matches!(
        h.bridge.initialize_graphics_context(id),
        Err(BridgeError::NotReady { .. })
    ));
    assert!(matches!(h.bridge.pause(id), Err(BridgeError::NotReady { .. })));
    assert!(matches!(h.bridge.stop(id), Err(BridgeError::NotReady { .. })));
    assert_eq!(h.bridge.state(id), Ok(LifecycleState::GlReady));

    h.bridge.start(id).unwrap();
    assert_eq!(
        h.bridge.resume(id),
        Err(BridgeError::NotReady {
            state: LifecycleState::Started,
            operation: "resume",
        })
    );
    assert_eq!(h.bridge.state(id), Ok(LifecycleState::Started));
    assert_eq!(h.recorder.count(|call| *call == EngineCall::Resume), 0);
}

#[test]
fn test_every_call_after_destroy_reports_destroyed() {
    let mut h = Harness::new();
    let id = h.started(BackendKind::ArSession);
    h.bridge.destroy(id).unwrap();
    h.recorder.clear();

    assert_eq!(h.bridge.start(id), destroyed("start"));
    assert_eq!(h.bridge.destroy(id), destroyed("destroy"));
    assert_eq!(h.bridge.draw_frame(id), destroyed("draw_frame"));
    assert_eq!(h.bridge.dispatch_touch(id, touch(TouchAction::Down)), destroyed("dispatch_touch"));
    assert_eq!(h.bridge.surface_created(id), destroyed("surface_created"));
    assert_eq!(h.bridge.set_suspended(id, true), destroyed("set_suspended"));
    assert_eq!(h.bridge.set_debug_hud(id, true), destroyed("set_debug_hud"));
    assert_eq!(h.bridge.headset_name(id), destroyed("headset_name"));
    assert_eq!(h.bridge.set_active_scene(id, None), destroyed("set_active_scene"));

    assert_eq!(h.bridge.state(id), Ok(LifecycleState::Destroyed));
    assert!(h.recorder.calls().is_empty());
}

#[test]
fn test_release_invalidates_identity() {
    let mut h = Harness::new();
    let id = h.started(BackendKind::EmbeddedSceneView);

    h.bridge.destroy(id).unwrap();
    h.bridge.release_instance(id).unwrap();

    let dangling = BridgeError::DanglingHandle {
        kind: HandleKind::Instance,
    };
    assert_eq!(h.bridge.state(id), Err(dangling.clone()));
    assert_eq!(h.bridge.start(id), Err(dangling.clone()));
    assert_eq!(h.bridge.release_instance(id), Err(dangling));
    assert_eq!(h.bridge.instance_count(), 0);
}

#[test]
fn test_release_live_instance_destroys_it_first() {
    let mut h = Harness::new();
    let id = h.started(BackendKind::EmbeddedSceneView);

    h.bridge.release_instance(id).unwrap();
    assert_eq!(h.recorder.count(|call| *call == EngineCall::Destroy), 1);
}

#[test]
fn test_surface_calls_require_graphics_context() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::EmbeddedSceneView);

    assert!(matches!(h.bridge.surface_created(id), Err(BridgeError::NotReady { .. })));
    h.bridge.initialize_graphics_context(id).unwrap();

    h.bridge.surface_created(id).unwrap();
    assert_eq!(h.bridge.surface(id), Ok(SurfaceState::Created));

    h.bridge.surface_changed(id, 0, 0).unwrap();
    assert_eq!(h.bridge.surface(id), Ok(SurfaceState::Created));

    h.bridge.surface_changed(id, 800, 600).unwrap();
    assert_eq!(
        h.bridge.surface(id),
        Ok(SurfaceState::Sized {
            width: 800,
            height: 600
        })
    );

    h.bridge.surface_destroyed(id).unwrap();
    assert_eq!(h.bridge.surface(id), Ok(SurfaceState::Absent));
    assert_eq!(
        h.recorder.calls()[1..],
        [
            EngineCall::SurfaceCreated,
            EngineCall::SurfaceChanged(800, 600),
            EngineCall::SurfaceDestroyed,
        ]
    );
}

#[test]
fn test_suspended_frames_are_skipped() {
    let mut h = Harness::new();
    let id = h.started(BackendKind::ArSession);

    h.bridge.set_suspended(id, true).unwrap();
    let report = h.bridge.draw_frame(id).unwrap();
    assert!(report.skipped);
    assert_eq!(report.frame_number, 0);
    assert!(h.recorder.draws().is_empty());

    h.bridge.set_suspended(id, false).unwrap();
    let report = h.bridge.draw_frame(id).unwrap();
    assert!(!report.skipped);
    assert_eq!(report.frame_number, 1);
    assert_eq!(
        h.recorder.count(|call| matches!(call, EngineCall::SetSuspended(_))),
        2
    );
}

#[test]
fn test_suspend_is_valid_in_any_live_state() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::HeadsetSdk);

    h.bridge.set_suspended(id, true).unwrap();
    h.bridge.set_suspended(id, true).unwrap();
    assert_eq!(h.bridge.is_suspended(id), Ok(true));
    assert_eq!(h.recorder.count(|call| *call == EngineCall::SetSuspended(true)), 1);
}

#[test]
fn test_input_requires_started_or_paused() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::EmbeddedSceneView);
    h.bridge.initialize_graphics_context(id).unwrap();

    let key = KeyEvent {
        code: 66,
        action: KeyAction::Down,
    };
    assert!(matches!(h.bridge.dispatch_key(id, key), Err(BridgeError::NotReady { .. })));

    h.bridge.start(id).unwrap();
    assert_eq!(h.bridge.dispatch_key(id, key), Ok(Dispatch::Delivered));
    h.bridge.pause(id).unwrap();
    assert_eq!(h.bridge.dispatch_touch(id, touch(TouchAction::Up)), Ok(Dispatch::Delivered));
    h.bridge.stop(id).unwrap();
    assert!(matches!(
        h.bridge.dispatch_touch(id, touch(TouchAction::Move)),
        Err(BridgeError::NotReady { .. })
    ));

    assert_eq!(h.recorder.count(|call| matches!(call, EngineCall::Key(_))), 1);
    assert_eq!(h.recorder.count(|call| matches!(call, EngineCall::Touch(_))), 1);
}

#[test]
fn test_gestures_are_ignored_without_gesture_tracking() {
    let mut h = Harness::new();
    let headset = h.started(BackendKind::HeadsetSdk);
    let ar = h.started(BackendKind::ArSession);
    let rotate = RotateEvent {
        state: GestureState::Move,
        radians: 0.3,
        x: 0.0,
        y: 0.0,
    };

    assert_eq!(h.bridge.dispatch_pinch(headset, pinch()), Ok(Dispatch::Ignored));
    assert_eq!(h.bridge.dispatch_rotate(headset, rotate), Ok(Dispatch::Ignored));
    assert_eq!(h.recorder.count(|call| matches!(call, EngineCall::Pinch(_))), 0);

    assert_eq!(h.bridge.dispatch_pinch(ar, pinch()), Ok(Dispatch::Delivered));
    assert_eq!(h.bridge.dispatch_rotate(ar, rotate), Ok(Dispatch::Delivered));
    assert_eq!(h.recorder.count(|call| matches!(call, EngineCall::Pinch(_))), 1);
}

#[test]
fn test_ignored_gestures_still_check_lifecycle() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::HeadsetSdk);

    assert!(matches!(h.bridge.dispatch_pinch(id, pinch()), Err(BridgeError::NotReady { .. })));
}

#[test]
fn test_backend_specific_operations_are_gated() {
    let mut h = Harness::new();
    let sdk = h.create(BackendKind::HeadsetSdk);
    let standalone = h.create(BackendKind::StandaloneHeadset);

    h.bridge.set_vr_mode_enabled(sdk, false).unwrap();
    assert_eq!(h.bridge.vr_mode_enabled(sdk), Ok(false));
    assert_eq!(
        h.bridge.recenter_tracking(sdk),
        Err(BridgeError::UnsupportedByBackend {
            backend: BackendKind::HeadsetSdk,
            operation: "recenter_tracking",
        })
    );

    h.bridge.recenter_tracking(standalone).unwrap();
    assert_eq!(
        h.bridge.set_vr_mode_enabled(standalone, true),
        Err(BridgeError::UnsupportedByBackend {
            backend: BackendKind::StandaloneHeadset,
            operation: "set_vr_mode_enabled",
        })
    );
    assert_eq!(h.bridge.vr_mode_enabled(standalone), Ok(true));

    assert_eq!(
        h.recorder.calls(),
        vec![EngineCall::SetVrMode(false), EngineCall::Recenter]
    );
}

#[test]
fn test_construction_rejects_unusable_input() {
    let mut h = Harness::new();
    let result = h.bridge.create_ar_session(
        &h.platform,
        super::support::assets(),
        ArSessionHandle {
            session: NativeRef::NULL,
            view: NativeRef(1),
        },
    );
    assert!(matches!(
        result,
        Err(BridgeError::BackendInitialization {
            backend: BackendKind::ArSession,
            ..
        })
    ));

    let failing = PlatformContext::new(
        DisplayInfo::new(1920, 1080, 2.0),
        Rc::new(RecordingProvider::failing("no GPU")),
    );
    match create(&mut h.bridge, &failing, BackendKind::EmbeddedSceneView) {
        Err(BridgeError::BackendInitialization { reason, .. }) => {
            assert!(reason.contains("no GPU"));
        }
        other => panic!("expected initialization failure, got {other:?}"),
    }

    let no_display = PlatformContext::new(
        DisplayInfo::new(0, 0, 1.0),
        Rc::new(RecordingProvider::new(Recorder::new())),
    );
    assert!(create(&mut h.bridge, &no_display, BackendKind::HeadsetSdk).is_err());
    assert_eq!(h.bridge.instance_count(), 0);
}

#[test]
fn test_debug_hud_follows_config_and_calls() {
    let mut h = Harness::with_config(BridgeConfig::new().with_debug_hud(true));
    let id = h.create(BackendKind::StandaloneHeadset);
    assert_eq!(h.bridge.debug_hud_enabled(id), Ok(true));

    h.bridge.set_debug_hud(id, false).unwrap();
    assert_eq!(h.bridge.debug_hud_enabled(id), Ok(false));
    assert_eq!(
        h.recorder.calls(),
        vec![EngineCall::SetDebugHud(true), EngineCall::SetDebugHud(false)]
    );
}

#[test]
fn test_device_names_come_from_engine() {
    let mut h = Harness::new();
    let id = h.create(BackendKind::HeadsetSdk);

    assert_eq!(h.bridge.headset_name(id).unwrap(), "recording-headset");
    assert_eq!(h.bridge.controller_name(id).unwrap(), "recording-controller");
}

#[test]
fn test_dropping_bridge_tears_down_live_instances() {
    let mut h = Harness::new();
    let live = h.started(BackendKind::ArSession);
    let gone = h.started(BackendKind::ArSession);
    h.bridge.destroy(gone).unwrap();
    assert_ne!(live, gone);

    let Harness { bridge, recorder, .. } = h;
    drop(bridge);
    assert_eq!(recorder.count(|call| *call == EngineCall::Destroy), 2);
}
