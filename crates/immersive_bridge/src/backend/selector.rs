//! Backend selection and construction
//!
//! Validates the platform context and the backend-specific input, then asks
//! the platform's [`EngineProvider`](crate::engine::EngineProvider) for a
//! native engine. Any failure is a [`BridgeError::BackendInitialization`]
//! and no instance is created.

use super::{AssetSource, BackendSpec, BackendVariant, PlatformContext};
use crate::engine::RenderEngine;
use crate::error::{BridgeError, BridgeResult};

/// Engine constructed for a validated backend request
pub(crate) struct SelectedBackend {
    pub spec: BackendSpec,
    pub engine: Box<dyn RenderEngine>,
}

/// Construct the engine for `variant`
pub(crate) fn construct(
    platform: &PlatformContext,
    assets: AssetSource,
    variant: BackendVariant,
) -> BridgeResult<SelectedBackend> {
    let backend = variant.kind();
    let fail = |reason: String| {
        log::error!("Cannot construct {backend} backend: {reason}");
        BridgeError::BackendInitialization { backend, reason }
    };

    platform
        .display()
        .validate()
        .map_err(|reason| fail(format!("platform context unusable: {reason}")))?;
    variant.validate().map_err(fail)?;
    if assets.root().as_os_str().is_empty() {
        return Err(fail("asset root is empty".to_string()));
    }

    let spec = BackendSpec {
        variant,
        display: platform.display(),
        assets,
    };

    let engine = platform
        .provider()
        .spawn(&spec)
        .map_err(|fault| fail(fault.to_string()))?;

    log::info!(
        "Constructed {backend} engine for {}x{} display",
        spec.display.width,
        spec.display.height
    );
    Ok(SelectedBackend { spec, engine })
}
