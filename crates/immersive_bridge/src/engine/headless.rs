//! In-process engine without a display
//!
//! `HeadlessEngine` keeps the state a native engine would keep (surface
//! size, scene binding, flags) and answers hit tests against a fixed set
//! of tracked planes and feature points. Hit tests run on a dedicated,
//! named render thread and complete their responders from there, the way
//! a native AR engine completes them from its rendering thread.

use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{EngineFault, EngineProvider, FrameContext, RenderEngine, SceneBinding};
use crate::backend::{BackendKind, BackendSpec, NativeRef};
use crate::config::HeadlessConfig;
use crate::events::{ClickState, KeyEvent, PinchEvent, RotateEvent, TouchAction, TouchEvent};
use crate::foundation::math::{Direction, Mat4, Ray, Unit, Vec3};
use crate::query::{HitResultKind, HitTestQuery, HitTestResponder, HitTestResult};

/// Largest distance between a ray and a feature point that still counts as a hit
const FEATURE_POINT_RADIUS: f32 = 0.05;

/// Planes whose normal is this close to vertical are horizontal
const HORIZONTAL_NORMAL_Y: f32 = 0.9;

/// A plane known to the tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPlane {
    /// Center of the plane in world space
    pub center: Vec3,
    /// Plane normal
    pub normal: Direction,
    /// Radius of the detected polygon; `None` for a plane estimated from
    /// feature points that has no detected boundary
    pub extent: Option<f32>,
}

impl TrackedPlane {
    /// A detected plane with a boundary of radius `extent`
    pub fn detected(center: Vec3, normal: Vec3, extent: f32) -> Self {
        Self {
            center,
            normal: Unit::new_normalize(normal),
            extent: Some(extent),
        }
    }

    /// A plane estimated from feature points
    pub fn estimated(center: Vec3, normal: Vec3) -> Self {
        Self {
            center,
            normal: Unit::new_normalize(normal),
            extent: None,
        }
    }

    fn is_horizontal(&self) -> bool {
        self.normal.y.abs() > HORIZONTAL_NORMAL_Y
    }

    fn intersect(&self, ray: &Ray) -> Option<HitTestResult> {
        let denom = self.normal.dot(&ray.direction.into_inner());
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let t = self.normal.dot(&(self.center - ray.origin)) / denom;
        if t <= 0.0 {
            return None;
        }

        let point = ray.point_at(t);
        let offset = point - self.center;
        let kind = match self.extent {
            Some(extent) if offset.norm() <= extent => HitResultKind::ExistingPlaneUsingExtent,
            Some(_) => HitResultKind::ExistingPlane,
            None if self.is_horizontal() => HitResultKind::EstimatedHorizontalPlane,
            None => HitResultKind::EstimatedVerticalPlane,
        };

        Some(HitTestResult {
            kind,
            distance: t,
            world_transform: Mat4::new_translation(&point),
            local_transform: Mat4::new_translation(&offset),
        })
    }
}

/// Everything the headless tracker knows about the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackedWorld {
    /// Tracked planes
    pub planes: Vec<TrackedPlane>,
    /// Tracked feature points
    pub feature_points: Vec<Vec3>,
}

impl TrackedWorld {
    /// Every hit along `ray`, nearest first
    pub fn raycast(&self, ray: &Ray) -> Vec<HitTestResult> {
        let planes = self.planes.iter().filter_map(|plane| plane.intersect(ray));
        let points = self.feature_points.iter().filter_map(|point| {
            let t = (point - ray.origin).dot(&ray.direction.into_inner());
            if t <= 0.0 || (ray.point_at(t) - point).norm() > FEATURE_POINT_RADIUS {
                return None;
            }
            Some(HitTestResult {
                kind: HitResultKind::FeaturePoint,
                distance: t,
                world_transform: Mat4::new_translation(point),
                local_transform: Mat4::identity(),
            })
        });

        let mut hits: Vec<HitTestResult> = planes.chain(points).collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Provider spawning [`HeadlessEngine`]s over a shared tracked world
#[derive(Debug, Clone, Default)]
pub struct HeadlessProvider {
    config: HeadlessConfig,
    world: TrackedWorld,
}

impl HeadlessProvider {
    /// Provider with an empty world
    pub fn new(config: HeadlessConfig) -> Self {
        Self {
            config,
            world: TrackedWorld::default(),
        }
    }

    /// Add a tracked plane
    pub fn with_plane(mut self, plane: TrackedPlane) -> Self {
        self.world.planes.push(plane);
        self
    }

    /// Add a tracked feature point
    pub fn with_feature_point(mut self, point: Vec3) -> Self {
        self.world.feature_points.push(point);
        self
    }

    /// World handed to every spawned engine
    pub fn world(&self) -> &TrackedWorld {
        &self.world
    }
}

impl EngineProvider for HeadlessProvider {
    fn spawn(&self, spec: &BackendSpec) -> Result<Box<dyn RenderEngine>, EngineFault> {
        let engine = HeadlessEngine::spawn(spec.kind(), self.config.clone(), self.world.clone())?;
        Ok(Box::new(engine))
    }
}

enum Job {
    HitTest {
        ray: Ray,
        responder: HitTestResponder,
    },
}

/// Display-less engine with a render thread for spatial queries
pub struct HeadlessEngine {
    backend: BackendKind,
    config: HeadlessConfig,
    surface: (u32, u32),
    scene: SceneBinding,
    point_of_view: Option<NativeRef>,
    frames: u64,
    suspended: bool,
    debug_hud: bool,
    vr_mode: bool,
    touch_down: bool,
    jobs: Option<Sender<Job>>,
    render_thread: Option<thread::JoinHandle<()>>,
}

impl HeadlessEngine {
    /// Start the render thread and return the engine
    pub fn spawn(
        backend: BackendKind,
        config: HeadlessConfig,
        world: TrackedWorld,
    ) -> Result<Self, EngineFault> {
        let (sender, receiver) = unbounded();
        let render_thread = thread::Builder::new()
            .name(config.render_thread_name.clone())
            .spawn(move || render_loop(&receiver, &world))
            .map_err(|err| EngineFault(format!("cannot start render thread: {err}")))?;

        log::debug!(
            "Headless {backend} engine started render thread '{}'",
            config.render_thread_name
        );
        Ok(Self {
            backend,
            surface: (config.surface_width, config.surface_height),
            config,
            scene: SceneBinding::Detached,
            point_of_view: None,
            frames: 0,
            suspended: false,
            debug_hud: false,
            vr_mode: true,
            touch_down: false,
            jobs: Some(sender),
            render_thread: Some(render_thread),
        })
    }

    /// Frames drawn so far
    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Scene binding the engine renders
    pub fn scene(&self) -> SceneBinding {
        self.scene
    }

    /// Node driving the camera
    pub fn point_of_view(&self) -> Option<NativeRef> {
        self.point_of_view
    }

    /// Whether rendering is suspended
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Whether stereo presentation is on
    pub fn vr_mode_enabled(&self) -> bool {
        self.vr_mode
    }

    /// World-space ray through a surface pixel, camera at the origin looking down -Z
    pub fn screen_ray(&self, x: f32, y: f32) -> Option<Ray> {
        let (width, height) = self.surface;
        if width == 0 || height == 0 {
            return None;
        }
        let (width, height) = (width as f32, height as f32);
        let half_height = (self.config.vertical_fov_degrees.to_radians() * 0.5).tan();
        let half_width = half_height * width / height;

        let ndc_x = 2.0 * x / width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / height;
        Ray::new(Vec3::zeros(), Vec3::new(ndc_x * half_width, ndc_y * half_height, -1.0))
    }

    fn query_ray(&self, query: HitTestQuery) -> Result<Ray, String> {
        match query {
            HitTestQuery::Ray { origin, direction } => {
                Ray::new(origin, direction).ok_or_else(|| "degenerate ray".to_string())
            }
            HitTestQuery::Point { x, y } => self
                .screen_ray(x, y)
                .ok_or_else(|| format!("cannot unproject ({x}, {y})")),
            HitTestQuery::Position { point } => Ray::new(Vec3::zeros(), point)
                .ok_or_else(|| "position coincides with the camera".to_string()),
        }
    }

    fn shutdown(&mut self) {
        // Closing the channel ends the render loop once queued jobs are done
        self.jobs = None;
        if let Some(handle) = self.render_thread.take() {
            if handle.join().is_err() {
                log::error!("Headless render thread panicked");
            }
        }
    }
}

fn render_loop(receiver: &Receiver<Job>, world: &TrackedWorld) {
    while let Ok(job) = receiver.recv() {
        match job {
            Job::HitTest { ray, responder } => {
                let hits = world.raycast(&ray);
                log::trace!("Hit test {:?} found {} hit(s)", responder.token(), hits.len());
                responder.succeed(hits);
            }
        }
    }
}

impl RenderEngine for HeadlessEngine {
    fn initialize_graphics(&mut self) {
        log::debug!("Headless {} engine: graphics ready", self.backend);
    }

    fn on_start(&mut self) {}

    fn on_pause(&mut self) {}

    fn on_resume(&mut self) {}

    fn on_stop(&mut self) {}

    fn on_surface_created(&mut self) {}

    fn on_surface_changed(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
    }

    fn on_surface_destroyed(&mut self) {}

    fn draw_frame(&mut self, frame: &FrameContext) {
        self.frames += 1;
        log::trace!(
            "Headless frame {} ({} root(s), progress {:?}, hud {})",
            frame.frame_number,
            frame.renderable.len(),
            frame.transition_progress,
            self.debug_hud
        );
    }

    fn on_touch(&mut self, event: TouchEvent) {
        let clicks: &[ClickState] = match event.action {
            TouchAction::Down if !self.touch_down => {
                self.touch_down = true;
                &[ClickState::ClickDown]
            }
            TouchAction::Up if self.touch_down => {
                self.touch_down = false;
                &[ClickState::ClickUp, ClickState::Clicked]
            }
            TouchAction::Cancel => {
                self.touch_down = false;
                &[]
            }
            _ => &[],
        };
        for click in clicks {
            log::debug!("Headless click {click:?} at ({}, {})", event.x, event.y);
        }
    }

    fn on_key(&mut self, event: KeyEvent) {
        log::trace!("Headless key {} {:?}", event.code, event.action);
    }

    fn on_pinch(&mut self, event: PinchEvent) {
        log::trace!("Headless pinch {:?} scale {}", event.state, event.scale);
    }

    fn on_rotate(&mut self, event: RotateEvent) {
        log::trace!("Headless rotate {:?} {} rad", event.state, event.radians);
    }

    fn set_scene(&mut self, binding: SceneBinding) {
        self.scene = binding;
    }

    fn set_point_of_view(&mut self, node: Option<NativeRef>) {
        self.point_of_view = node;
    }

    fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    fn set_debug_hud(&mut self, enabled: bool) {
        self.debug_hud = enabled;
    }

    fn set_vr_mode(&mut self, enabled: bool) {
        self.vr_mode = enabled;
    }

    fn recenter_tracking(&mut self) {
        log::debug!("Headless {} engine: tracking recentered", self.backend);
    }

    fn headset_name(&self) -> String {
        match self.backend {
            BackendKind::HeadsetSdk => "cardboard",
            BackendKind::StandaloneHeadset => "gearvr",
            BackendKind::ArSession | BackendKind::EmbeddedSceneView => "mobile",
        }
        .to_string()
    }

    fn controller_name(&self) -> String {
        match self.backend {
            BackendKind::HeadsetSdk => "daydream",
            BackendKind::StandaloneHeadset => "oculus-touch",
            BackendKind::ArSession | BackendKind::EmbeddedSceneView => "touchscreen",
        }
        .to_string()
    }

    fn hit_test(&mut self, query: HitTestQuery, responder: HitTestResponder) {
        let ray = match self.query_ray(query) {
            Ok(ray) => ray,
            Err(reason) => return responder.fail(reason),
        };
        match &self.jobs {
            Some(jobs) => {
                if let Err(err) = jobs.send(Job::HitTest { ray, responder }) {
                    // The job (and its responder) comes back with the error;
                    // dropping it reports the failure.
                    log::error!("Headless render thread is gone");
                    drop(err);
                }
            }
            None => responder.fail("engine destroyed"),
        }
    }

    fn destroy(&mut self) {
        self.shutdown();
        log::debug!("Headless {} engine destroyed after {} frame(s)", self.backend, self.frames);
    }
}

impl Drop for HeadlessEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
