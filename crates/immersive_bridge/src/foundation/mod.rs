//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the bridge:
//! - Math types for spatial queries
//! - Generational handle registries
//! - Time sources for scene transitions
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
pub mod time;
