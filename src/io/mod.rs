//! I/O operations for loading and saving data.
//!
//! This module handles all file format parsing and export:
//! - dataset layout (undistorted images, masks, reconstruction, tracks)
//! - the binary scene format consumed by the dense reconstruction stage

mod dataset;
mod mvs;

// Re-export public types and functions
pub use dataset::{load_reconstructions, load_tracks, DatasetPaths, LoadError};
pub use mvs::{read_scene, MvsScene, SceneCamera, ScenePoint, SceneShot, SceneSink};
