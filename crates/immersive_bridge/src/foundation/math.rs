//! Math utilities and types
//!
//! Only the small set of types the bridge needs to describe spatial probes
//! and hit results. Rendering math lives in the engine.

pub use nalgebra::{Matrix4, Unit, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Unit-length 3D direction
pub type Direction = Unit<Vec3>;

/// Ray with an origin and a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin in world space
    pub origin: Vec3,
    /// Normalized ray direction
    pub direction: Direction,
}

impl Ray {
    /// Create a ray, normalizing `direction`
    ///
    /// Returns `None` when the direction is zero-length or not finite.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        if !origin.iter().all(|c| c.is_finite()) || !direction.iter().all(|c| c.is_finite()) {
            return None;
        }
        Unit::try_new(direction, f32::EPSILON).map(|direction| Self { origin, direction })
    }

    /// Point along the ray at parameter `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction.into_inner() * t
    }
}
