//! Bridge error taxonomy
//!
//! Every error is surfaced synchronously to the immediate caller. Failures
//! of asynchronous spatial queries are not errors here; they reach the
//! completion handler as a [`QueryFailure`](crate::query::QueryFailure).

use thiserror::Error;

use crate::backend::BackendKind;
use crate::foundation::collections::HandleKind;
use crate::lifecycle::LifecycleState;

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors reported by bridge operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// Platform context or backend input was unusable; no instance was created
    #[error("Backend initialization failed for {backend}: {reason}")]
    BackendInitialization {
        /// Backend that was being constructed
        backend: BackendKind,
        /// What was wrong with the input
        reason: String,
    },

    /// Operation is specific to a backend other than the instance's
    #[error("Operation '{operation}' is not supported by the {backend} backend")]
    UnsupportedByBackend {
        /// Backend of the instance
        backend: BackendKind,
        /// Rejected operation
        operation: &'static str,
    },

    /// Operation is not valid in the instance's current lifecycle state
    #[error("Operation '{operation}' is not valid in state {state}")]
    NotReady {
        /// State the instance was in (unchanged)
        state: LifecycleState,
        /// Rejected operation
        operation: &'static str,
    },

    /// Operation on an instance that has been torn down
    #[error("Operation '{operation}' called on a destroyed engine instance")]
    InstanceDestroyed {
        /// Rejected operation
        operation: &'static str,
    },

    /// Identity was never registered or has been invalidated
    #[error("Dangling {kind} handle")]
    DanglingHandle {
        /// Kind of identity that failed to resolve
        kind: HandleKind,
    },
}

impl BridgeError {
    /// Whether the error points at a caller bug rather than an environment problem
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            Self::NotReady { .. } | Self::InstanceDestroyed { .. } | Self::DanglingHandle { .. }
        )
    }
}
