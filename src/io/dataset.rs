//! Dataset directory layout and reconstruction loading.
//!
//! A dataset root contains the output of the sparse pipeline's undistortion
//! step plus the scene written by this crate:
//!
//! ```text
//! <root>/
//!   undistorted/
//!     reconstruction.json    JSON array of reconstructions
//!     tracks.csv             tab-separated observations
//!     images/<shot id>       undistorted images
//!     masks/<shot id>.png    optional masks
//!   openmvs/
//!     scene.mvs              the exported scene
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::Vector3;
use serde::Deserialize;
use thiserror::Error;

use crate::core::{Camera, Point, Pose, Reconstruction, Shot, TracksManager};

/// Errors that can occur when loading dataset files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid reconstruction file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// Resolves the fixed file layout under a dataset root.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    root: PathBuf,
}

impl DatasetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The undistorted reconstruction produced by the sparse pipeline.
    pub fn reconstruction_file(&self) -> PathBuf {
        self.root.join("undistorted").join("reconstruction.json")
    }

    /// Per-point observations of the undistorted reconstruction.
    pub fn tracks_file(&self) -> PathBuf {
        self.root.join("undistorted").join("tracks.csv")
    }

    /// Undistorted image for a shot. Shot ids are image file names.
    pub fn image_file(&self, shot_id: &str) -> PathBuf {
        self.root.join("undistorted").join("images").join(shot_id)
    }

    /// Optional mask for a shot; shares the shot id with a fixed suffix.
    pub fn mask_file(&self, shot_id: &str) -> PathBuf {
        self.root
            .join("undistorted")
            .join("masks")
            .join(format!("{shot_id}.png"))
    }

    /// Where the exported scene is written.
    pub fn scene_file(&self) -> PathBuf {
        self.root.join("openmvs").join("scene.mvs")
    }
}

// On-disk shapes of reconstruction.json. Shots store their rotation as an
// axis-angle vector; extra per-camera fields (distortion, etc.) are ignored.
#[derive(Debug, Deserialize)]
struct ShotDoc {
    camera: String,
    rotation: [f64; 3],
    translation: [f64; 3],
}

#[derive(Debug, Deserialize)]
struct PointDoc {
    coordinates: [f64; 3],
}

#[derive(Debug, Deserialize)]
struct ReconstructionDoc {
    #[serde(default)]
    cameras: BTreeMap<String, Camera>,
    #[serde(default)]
    shots: BTreeMap<String, ShotDoc>,
    #[serde(default)]
    points: BTreeMap<String, PointDoc>,
}

fn build_reconstruction(doc: ReconstructionDoc) -> Reconstruction {
    let shots = doc
        .shots
        .into_iter()
        .map(|(id, shot)| {
            let pose = Pose::from_axis_angle(
                &Vector3::from(shot.rotation),
                Vector3::from(shot.translation),
            );
            (
                id,
                Shot {
                    camera: shot.camera,
                    pose,
                },
            )
        })
        .collect();
    let points = doc
        .points
        .into_iter()
        .map(|(id, point)| {
            (
                id,
                Point {
                    coordinates: Vector3::from(point.coordinates),
                },
            )
        })
        .collect();

    Reconstruction {
        cameras: doc.cameras,
        shots,
        points,
    }
}

/// Load every reconstruction stored in the dataset.
///
/// The file holds a JSON array; an empty array is valid and yields an empty
/// vector.
pub fn load_reconstructions(paths: &DatasetPaths) -> Result<Vec<Reconstruction>, LoadError> {
    let file = File::open(paths.reconstruction_file())?;
    let docs: Vec<ReconstructionDoc> = serde_json::from_reader(BufReader::new(file))?;
    let reconstructions: Vec<Reconstruction> =
        docs.into_iter().map(build_reconstruction).collect();
    debug!(
        "loaded {} reconstruction(s) from {}",
        reconstructions.len(),
        paths.reconstruction_file().display()
    );
    Ok(reconstructions)
}

/// Load per-point observations from the tab-separated tracks file.
///
/// The first line may be a version header (`OPENSFM_TRACKS_VERSION...`).
/// Each data row starts with the observing image and the track id; the
/// remaining feature columns are ignored here.
pub fn load_tracks(paths: &DatasetPaths) -> Result<TracksManager, LoadError> {
    let file = File::open(paths.tracks_file())?;
    let reader = BufReader::new(file);

    let mut tracks = TracksManager::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if index == 0 && line.starts_with("OPENSFM_TRACKS_VERSION") {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let (image, track_id) = match (fields.next(), fields.next()) {
            (Some(image), Some(track_id)) if !image.is_empty() => (image, track_id),
            _ => {
                return Err(LoadError::InvalidFormat(format!(
                    "tracks line {}: expected image and track id",
                    index + 1
                )))
            }
        };
        tracks.add_observation(track_id, image);
    }
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::TempDir;

    fn dataset_with(reconstruction: &str, tracks: &str) -> (TempDir, DatasetPaths) {
        let dir = TempDir::new().unwrap();
        let paths = DatasetPaths::new(dir.path());
        fs::create_dir_all(dir.path().join("undistorted")).unwrap();
        fs::write(paths.reconstruction_file(), reconstruction).unwrap();
        fs::write(paths.tracks_file(), tracks).unwrap();
        (dir, paths)
    }

    #[test]
    fn loads_cameras_shots_and_points() {
        let (_dir, paths) = dataset_with(
            r#"[{
                "cameras": {
                    "cam1": {"projection_type": "perspective", "focal": 0.8,
                             "width": 1000, "height": 800, "k1": 0.0, "k2": 0.0}
                },
                "shots": {
                    "im1.jpg": {"camera": "cam1",
                                "rotation": [0.0, 0.0, 0.0],
                                "translation": [1.0, 2.0, 3.0]}
                },
                "points": {
                    "12": {"coordinates": [0.5, -0.5, 4.0], "color": [255, 0, 0]}
                }
            }]"#,
            "OPENSFM_TRACKS_VERSION_v2\nim1.jpg\t12\t0\t0.1\t0.2\t1.0\t255\t0\t0\t-1\t-1\n",
        );

        let reconstructions = load_reconstructions(&paths).unwrap();
        assert_eq!(reconstructions.len(), 1);
        let reconstruction = &reconstructions[0];
        assert!(reconstruction.cameras["cam1"].is_perspective());

        let shot = &reconstruction.shots["im1.jpg"];
        assert_eq!(shot.camera, "cam1");
        assert_relative_eq!(shot.pose.translation, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(
            reconstruction.points["12"].coordinates,
            Vector3::new(0.5, -0.5, 4.0)
        );

        let tracks = load_tracks(&paths).unwrap();
        assert!(tracks.track_observations("12").unwrap().contains("im1.jpg"));
    }

    #[test]
    fn empty_reconstruction_array_is_valid() {
        let (_dir, paths) = dataset_with("[]", "OPENSFM_TRACKS_VERSION_v2\n");
        assert!(load_reconstructions(&paths).unwrap().is_empty());
        assert!(load_tracks(&paths).unwrap().is_empty());
    }

    #[test]
    fn truncated_tracks_row_is_an_error() {
        let (_dir, paths) = dataset_with("[]", "im1.jpg\n");
        let err = load_tracks(&paths).unwrap_err();
        assert!(matches!(err, LoadError::InvalidFormat(_)));
    }

    #[test]
    fn mask_path_carries_png_suffix() {
        let paths = DatasetPaths::new("/data/set");
        assert!(paths.mask_file("im1.jpg").ends_with("masks/im1.jpg.png"));
        assert!(paths.image_file("im1.jpg").ends_with("images/im1.jpg"));
        assert!(paths.scene_file().ends_with("openmvs/scene.mvs"));
    }
}
