//! Backend variants and their construction inputs
//!
//! Each engine instance is bound to exactly one [`BackendKind`] for its
//! whole life. The kind declares a [`Capabilities`] set; backend-specific
//! operations on an instance whose kind lacks the capability fail with
//! [`BridgeError::UnsupportedByBackend`].

pub mod selector;

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::engine::EngineProvider;
use crate::error::{BridgeError, BridgeResult};

/// Mutually exclusive engine backend variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// Phone-in-headset SDK (context supplied by the headset SDK)
    HeadsetSdk,
    /// Standalone headset driven by its own activity
    StandaloneHeadset,
    /// Camera passthrough backed by an AR tracking session
    ArSession,
    /// Plain 3D view embedded in the host's view hierarchy
    EmbeddedSceneView,
}

bitflags! {
    /// Optional operations a backend supports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Spatial hit-testing against the tracked environment
        const HIT_TEST = 1 << 0;
        /// Resetting the tracked forward direction
        const RECENTER_TRACKING = 1 << 1;
        /// Switching between stereo and mono presentation
        const VR_MODE_TOGGLE = 1 << 2;
        /// Pinch and rotate gesture tracking
        const GESTURES = 1 << 3;
    }
}

impl BackendKind {
    /// All backend variants
    pub const ALL: [Self; 4] = [
        Self::HeadsetSdk,
        Self::StandaloneHeadset,
        Self::ArSession,
        Self::EmbeddedSceneView,
    ];

    /// Operations this backend supports beyond the common contract
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::HeadsetSdk => Capabilities::VR_MODE_TOGGLE,
            Self::StandaloneHeadset => Capabilities::RECENTER_TRACKING,
            Self::ArSession => Capabilities::HIT_TEST | Capabilities::GESTURES,
            Self::EmbeddedSceneView => Capabilities::GESTURES,
        }
    }

    /// Whether this backend has every capability in `capability`
    pub fn supports(self, capability: Capabilities) -> bool {
        self.capabilities().contains(capability)
    }

    /// Fail with [`BridgeError::UnsupportedByBackend`] unless `capability` is supported
    pub fn require(self, capability: Capabilities, operation: &'static str) -> BridgeResult<()> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(BridgeError::UnsupportedByBackend {
                backend: self,
                operation,
            })
        }
    }

    /// Short name used in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::HeadsetSdk => "headset-sdk",
            Self::StandaloneHeadset => "standalone-headset",
            Self::ArSession => "ar-session",
            Self::EmbeddedSceneView => "scene-view",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque reference to a platform- or engine-owned native object
///
/// Zero is the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativeRef(pub u64);

impl NativeRef {
    /// The null reference
    pub const NULL: Self = Self(0);

    /// Whether this is the null reference
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Display properties of the surface owner at construction time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel density scale
    pub density: f32,
}

impl DisplayInfo {
    /// Create display info
    pub fn new(width: u32, height: u32, density: f32) -> Self {
        Self { width, height, density }
    }

    fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("display has no area ({}x{})", self.width, self.height));
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(format!("display density {} is not positive", self.density));
        }
        Ok(())
    }
}

/// Where the engine reads assets from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    root: PathBuf,
}

impl AssetSource {
    /// Assets rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the asset tree
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Platform collaborator handed to every construction entry point
///
/// Supplies display and engine access; consumed at construction only.
#[derive(Clone)]
pub struct PlatformContext {
    display: DisplayInfo,
    provider: Rc<dyn EngineProvider>,
}

impl PlatformContext {
    /// Create a platform context
    pub fn new(display: DisplayInfo, provider: Rc<dyn EngineProvider>) -> Self {
        Self { display, provider }
    }

    /// Display properties
    pub fn display(&self) -> DisplayInfo {
        self.display
    }

    pub(crate) fn provider(&self) -> &dyn EngineProvider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformContext")
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

/// Context object from the phone-in-headset SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadsetSdkContext {
    /// Native SDK context
    pub native: NativeRef,
}

/// Activity and view that own a standalone headset session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRef {
    /// Native activity
    pub activity: NativeRef,
    /// Native view the headset presents into
    pub view: NativeRef,
}

/// Live AR tracking session
///
/// Must be kept alive by its owner for the lifetime of the instance built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArSessionHandle {
    /// Native tracking session
    pub session: NativeRef,
    /// Native camera view
    pub view: NativeRef,
}

/// Host view an embedded scene renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneViewRef {
    /// Native view
    pub view: NativeRef,
}

/// Backend-specific construction input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendVariant {
    /// Phone-in-headset SDK
    HeadsetSdk(HeadsetSdkContext),
    /// Standalone headset
    StandaloneHeadset(ActivityRef),
    /// AR session
    ArSession(ArSessionHandle),
    /// Embedded scene view
    EmbeddedSceneView(SceneViewRef),
}

impl BackendVariant {
    /// Backend this input constructs
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::HeadsetSdk(_) => BackendKind::HeadsetSdk,
            Self::StandaloneHeadset(_) => BackendKind::StandaloneHeadset,
            Self::ArSession(_) => BackendKind::ArSession,
            Self::EmbeddedSceneView(_) => BackendKind::EmbeddedSceneView,
        }
    }

    fn validate(&self) -> Result<(), String> {
        let missing = match self {
            Self::HeadsetSdk(sdk) if sdk.native.is_null() => Some("headset SDK context"),
            Self::StandaloneHeadset(activity) if activity.activity.is_null() => Some("activity"),
            Self::StandaloneHeadset(activity) if activity.view.is_null() => Some("headset view"),
            Self::ArSession(ar) if ar.session.is_null() => Some("AR session"),
            Self::ArSession(ar) if ar.view.is_null() => Some("AR camera view"),
            Self::EmbeddedSceneView(view) if view.view.is_null() => Some("scene view"),
            _ => None,
        };
        match missing {
            Some(what) => Err(format!("{what} is null")),
            None => Ok(()),
        }
    }
}

/// Validated construction request handed to the [`EngineProvider`]
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSpec {
    /// Backend-specific input
    pub variant: BackendVariant,
    /// Display properties
    pub display: DisplayInfo,
    /// Asset source
    pub assets: AssetSource,
}

impl BackendSpec {
    /// Backend being constructed
    pub fn kind(&self) -> BackendKind {
        self.variant.kind()
    }
}
