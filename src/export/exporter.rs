//! Scene export orchestration.
//!
//! `SceneExporter` drives one reconstruction through a `SceneSink` in a
//! fixed phase order: cameras, then shots, then points, then the final
//! write. The phases never repeat or interleave; the whole export is one
//! synchronous pass.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::core::{Pose, Reconstruction, TracksManager};
use crate::export::{
    load_allow_list, load_correction, ExportError, SceneCorrection, ShotAllowList,
    VisibilityFilter,
};
use crate::io::{load_reconstructions, load_tracks, DatasetPaths, MvsScene, SceneSink};

/// Counters reported after a completed export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Cameras registered with the scene.
    pub cameras: usize,

    /// Shots registered with the scene.
    pub shots: usize,

    /// Points exported with at least one surviving observation.
    pub points: usize,

    /// Observations discarded by the depth test.
    pub rejected_observations: u64,
}

/// Exports a reconstruction into a scene sink, applying the correction
/// offset, the optional shot allow-list and per-observation visibility
/// filtering.
pub struct SceneExporter<'a> {
    paths: &'a DatasetPaths,
    correction: SceneCorrection,
    allow_list: Option<ShotAllowList>,
}

impl<'a> SceneExporter<'a> {
    pub fn new(
        paths: &'a DatasetPaths,
        correction: SceneCorrection,
        allow_list: Option<ShotAllowList>,
    ) -> Self {
        Self {
            paths,
            correction,
            allow_list,
        }
    }

    /// Run the full export: register cameras, shots and points with the
    /// sink, then write the scene to the dataset's scene path.
    pub fn export<S: SceneSink>(
        &self,
        reconstruction: &Reconstruction,
        tracks: &TracksManager,
        sink: &mut S,
    ) -> Result<ExportStats, ExportError> {
        let cameras = self.register_cameras(reconstruction, sink);
        let shot_poses = self.register_shots(reconstruction, sink)?;
        let (points, rejected) = self.register_points(reconstruction, tracks, &shot_poses, sink);

        // The obb corners pass through uncorrected; only world coordinates
        // get the offset.
        sink.set_obb_min(
            self.correction.obb_min.x,
            self.correction.obb_min.y,
            self.correction.obb_min.z,
        );
        sink.set_obb_max(
            self.correction.obb_max.x,
            self.correction.obb_max.y,
            self.correction.obb_max.z,
        );
        sink.export(&self.paths.scene_file())?;

        let stats = ExportStats {
            cameras,
            shots: shot_poses.len(),
            points,
            rejected_observations: rejected,
        };
        info!(
            "removed {} observations behind the camera",
            stats.rejected_observations
        );
        Ok(stats)
    }

    /// Phase 1: register the intrinsic matrix of every perspective camera.
    ///
    /// Each matrix is derived once here and shared by every shot that
    /// references the camera. Unsupported projection models are skipped,
    /// which also keeps their shots out of the scene later.
    fn register_cameras<S: SceneSink>(
        &self,
        reconstruction: &Reconstruction,
        sink: &mut S,
    ) -> usize {
        let mut count = 0;
        for (camera_id, camera) in &reconstruction.cameras {
            let Some(k) = camera.intrinsic_matrix() else {
                debug!("skipping camera {camera_id}: unsupported projection model");
                continue;
            };
            sink.add_camera(camera_id, &k, camera.width, camera.height);
            count += 1;
        }
        count
    }

    /// Phase 2: register every eligible shot with its corrected origin.
    ///
    /// A shot is eligible when its camera is perspective and the allow-list
    /// (if any) names it. The undistorted image must exist; a missing mask
    /// degrades to an empty mask path. Returns the poses of the registered
    /// shots for the visibility phase.
    fn register_shots<S: SceneSink>(
        &self,
        reconstruction: &Reconstruction,
        sink: &mut S,
    ) -> Result<BTreeMap<String, Pose>, ExportError> {
        let mut shot_poses = BTreeMap::new();

        for (shot_id, shot) in &reconstruction.shots {
            if let Some(allow_list) = &self.allow_list {
                if !allow_list.contains(shot_id) {
                    continue;
                }
            }
            let Some(camera) = reconstruction.cameras.get(&shot.camera) else {
                debug!("skipping shot {shot_id}: unknown camera {}", shot.camera);
                continue;
            };
            if !camera.is_perspective() {
                continue;
            }

            let image_path = self.paths.image_file(shot_id);
            if !image_path.is_file() {
                return Err(ExportError::MissingImage(image_path));
            }
            let image_path = fs::canonicalize(&image_path)?;

            let mask_path = self.paths.mask_file(shot_id);
            let mask_path = if mask_path.is_file() {
                fs::canonicalize(&mask_path)?.to_string_lossy().into_owned()
            } else {
                String::new()
            };

            let origin = shot.pose.origin() - self.correction.offset;
            sink.add_shot(
                &image_path.to_string_lossy(),
                &mask_path,
                shot_id,
                &shot.camera,
                &shot.pose.rotation,
                &origin,
            );
            shot_poses.insert(shot_id.clone(), shot.pose.clone());
        }

        Ok(shot_poses)
    }

    /// Phase 3: register every point whose observations survive filtering.
    ///
    /// Candidate observers are the tracked observations intersected with the
    /// allow-list, then depth-tested against the registered shot poses. A
    /// point whose surviving set is empty is dropped entirely, so exported
    /// points only ever reference exported shots.
    fn register_points<S: SceneSink>(
        &self,
        reconstruction: &Reconstruction,
        tracks: &TracksManager,
        shot_poses: &BTreeMap<String, Pose>,
        sink: &mut S,
    ) -> (usize, u64) {
        let mut filter = VisibilityFilter::new(shot_poses);
        let mut exported = 0;

        for (point_id, point) in &reconstruction.points {
            let Some(observations) = tracks.track_observations(point_id) else {
                continue;
            };

            let observers: Vec<String> = observations
                .iter()
                .filter(|shot_id| {
                    self.allow_list
                        .as_ref()
                        .map_or(true, |list| list.contains(shot_id))
                })
                .filter(|shot_id| filter.observes(&point.coordinates, shot_id))
                .cloned()
                .collect();

            if observers.is_empty() {
                continue;
            }
            sink.add_point(&(point.coordinates - self.correction.offset), &observers);
            exported += 1;
        }

        (exported, filter.rejected())
    }
}

/// Load a dataset and export its first reconstruction.
///
/// Returns `Ok(None)` without writing anything when the dataset holds no
/// reconstructions at all.
pub fn export_dataset(
    paths: &DatasetPaths,
    image_list: Option<&Path>,
    corrections_file: Option<&Path>,
) -> Result<Option<ExportStats>, ExportError> {
    let correction = load_correction(corrections_file)?;
    let allow_list = load_allow_list(image_list)?;

    let reconstructions = load_reconstructions(paths)?;
    let Some(reconstruction) = reconstructions.first() else {
        return Ok(None);
    };
    let tracks = load_tracks(paths)?;

    let exporter = SceneExporter::new(paths, correction, allow_list);
    let mut scene = MvsScene::new();
    let stats = exporter.export(reconstruction, &tracks, &mut scene)?;
    Ok(Some(stats))
}
