//! Core data structures.
//!
//! This module contains the fundamental types used throughout the system:
//! - `Camera`: intrinsic camera parameters
//! - `Pose`: world-to-camera rigid transform
//! - `Reconstruction` / `TracksManager`: the sparse reconstruction graph
//!
//! All types here are "pure data" - no I/O, no export logic.

mod camera;
mod pose;
mod reconstruction;

// Re-export public types
pub use camera::{Camera, ProjectionType};
pub use pose::Pose;
pub use reconstruction::{Point, Reconstruction, Shot, TracksManager};
