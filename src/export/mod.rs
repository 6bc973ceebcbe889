//! The reconstruction-to-scene export pipeline.
//!
//! One export call runs four strictly ordered phases over a single
//! reconstruction: register cameras, register shots, register points, then
//! write the assembled scene. Corrections and the shot allow-list are parsed
//! up front, before any phase runs.

mod allow_list;
mod correction;
mod exporter;
mod visibility;

// Re-export public types and functions
pub use allow_list::{load_allow_list, ShotAllowList};
pub use correction::{load_correction, SceneCorrection};
pub use exporter::{export_dataset, ExportStats, SceneExporter};
pub use visibility::VisibilityFilter;

use std::path::PathBuf;

use thiserror::Error;

use crate::io::LoadError;

/// Errors that abort an export.
///
/// Per-shot and per-point skip conditions (unsupported camera model,
/// allow-list exclusion, depth rejection) are not errors; they only shrink
/// the exported scene.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed corrections file {path}: {source}")]
    MalformedCorrection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("undistorted image not found: {0}")]
    MissingImage(PathBuf),

    #[error(transparent)]
    Load(#[from] LoadError),
}
