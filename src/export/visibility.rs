//! Per-observation visibility filtering.

use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::core::Pose;

/// Depth-tests a point's observations against the poses of the shots that
/// made it into the scene.
///
/// The depth convention is inherited from the upstream sparse pipeline: a
/// camera-frame z above zero counts as behind the camera and the observation
/// is discarded. Note that this is inverted relative to the usual
/// positive-z-in-front convention; downstream consumers depend on it, so it
/// must not be flipped here.
///
/// Observations from shots that never made it into the scene (allow-list
/// exclusion, unsupported camera model) are discarded without touching the
/// rejection counter.
pub struct VisibilityFilter<'a> {
    shot_poses: &'a BTreeMap<String, Pose>,
    rejected: u64,
}

impl<'a> VisibilityFilter<'a> {
    /// Create a filter over the poses registered during shot export.
    pub fn new(shot_poses: &'a BTreeMap<String, Pose>) -> Self {
        Self {
            shot_poses,
            rejected: 0,
        }
    }

    /// Whether the observation of `point` from `shot_id` survives.
    pub fn observes(&mut self, point: &Vector3<f64>, shot_id: &str) -> bool {
        let Some(pose) = self.shot_poses.get(shot_id) else {
            return false;
        };

        let behind = pose.transform(point).z > 0.0;
        if behind {
            self.rejected += 1;
        }
        !behind
    }

    /// Total observations rejected by the depth test so far.
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}
