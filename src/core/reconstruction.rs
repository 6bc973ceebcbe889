//! The sparse reconstruction graph: cameras, posed shots, 3D points and
//! their observations.
//!
//! A `Reconstruction` is read-only input to the export pipeline; nothing in
//! this crate mutates one after loading. Maps are ordered so that two
//! exports of the same reconstruction walk it in the same order and produce
//! byte-identical scenes.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::Vector3;

use crate::core::{Camera, Pose};

/// One posed image within a reconstruction.
#[derive(Debug, Clone)]
pub struct Shot {
    /// Id of the owning camera.
    pub camera: String,

    /// World-to-camera pose.
    pub pose: Pose,
}

/// A triangulated 3D point.
#[derive(Debug, Clone)]
pub struct Point {
    /// World coordinates (double precision).
    pub coordinates: Vector3<f64>,
}

/// A self-consistent set of cameras, posed shots and triangulated points
/// resulting from a structure-from-motion computation.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    /// Cameras, indexed by camera id.
    pub cameras: BTreeMap<String, Camera>,

    /// Shots, indexed by shot id (usually the image file name).
    pub shots: BTreeMap<String, Shot>,

    /// Points, indexed by track id.
    pub points: BTreeMap<String, Point>,
}

/// Maps each point to the set of shots that observe it.
///
/// Insertion order is irrelevant; membership is all that matters here.
#[derive(Debug, Clone, Default)]
pub struct TracksManager {
    observations: BTreeMap<String, BTreeSet<String>>,
}

impl TracksManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `shot_id` observes the point `point_id`.
    pub fn add_observation(&mut self, point_id: &str, shot_id: &str) {
        self.observations
            .entry(point_id.to_string())
            .or_default()
            .insert(shot_id.to_string());
    }

    /// Shots observing the given point, if any were recorded.
    pub fn track_observations(&self, point_id: &str) -> Option<&BTreeSet<String>> {
        self.observations.get(point_id)
    }

    /// Number of tracked points.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observations_collapse_duplicates() {
        let mut tracks = TracksManager::new();
        tracks.add_observation("7", "im1.jpg");
        tracks.add_observation("7", "im2.jpg");
        tracks.add_observation("7", "im1.jpg");

        let shots = tracks.track_observations("7").unwrap();
        assert_eq!(shots.len(), 2);
        assert!(shots.contains("im1.jpg"));
        assert!(shots.contains("im2.jpg"));
    }

    #[test]
    fn unknown_point_has_no_observations() {
        let tracks = TracksManager::new();
        assert!(tracks.track_observations("42").is_none());
        assert!(tracks.is_empty());
    }
}
