//! # sfm2mvs: reconstruction-to-MVS scene export
//!
//! This crate takes a structure-from-motion reconstruction (cameras, posed
//! shots, triangulated 3D points and their per-shot observations) and writes
//! a self-consistent scene file for a dense multi-view stereo stage.
//!
//! The crate is organized into three modules:
//!
//! - `core`: fundamental data structures (cameras, poses, reconstructions)
//! - `export`: the export pipeline (corrections, allow-list, visibility
//!   filtering, phase orchestration)
//! - `io`: dataset loading and the binary scene format
//!
//! A typical export runs in one synchronous pass:
//!
//! 1. parse the optional corrections file and shot allow-list,
//! 2. register every perspective camera's intrinsic matrix,
//! 3. register eligible shots with their corrected origins,
//! 4. register points whose observations survive the depth filter,
//! 5. write the assembled scene to disk.

// Fundamental data structures
pub mod core;

// The export pipeline
pub mod export;

// Dataset loading and scene serialization
pub mod io;

// Re-export commonly used types at crate root for convenience
pub use crate::core::{Camera, Point, Pose, ProjectionType, Reconstruction, Shot, TracksManager};
pub use crate::export::{ExportError, ExportStats, SceneCorrection, SceneExporter, ShotAllowList};
pub use crate::io::{DatasetPaths, LoadError, MvsScene, SceneSink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
