//! Scene roots, nodes and the active-scene relationship
//!
//! The scene-graph collaborator owns scene structure. The bridge only holds
//! identities: [`SceneRoot`] and [`SceneNode`] records are registered to
//! obtain a [`SceneHandle`](crate::SceneHandle) or [`NodeHandle`](crate::NodeHandle),
//! and [`transition::SceneTransitionManager`] tracks which roots an
//! instance renders.

pub mod transition;

pub use transition::{SceneTransitionManager, TransitionCompleted};

use crate::backend::NativeRef;

/// Identity record of a scene root built by the scene-graph collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneRoot {
    /// Native scene object
    pub native: NativeRef,
    /// Label used in logs
    pub name: String,
}

impl SceneRoot {
    /// Create a scene root record
    pub fn new(native: NativeRef, name: impl Into<String>) -> Self {
        Self {
            native,
            name: name.into(),
        }
    }
}

/// Identity record of a scene node, used to anchor the camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    /// Native node object
    pub native: NativeRef,
    /// Label used in logs
    pub name: String,
}

impl SceneNode {
    /// Create a scene node record
    pub fn new(native: NativeRef, name: impl Into<String>) -> Self {
        Self {
            native,
            name: name.into(),
        }
    }
}
