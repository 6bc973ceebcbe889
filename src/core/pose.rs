//! Camera pose (world-to-camera rigid transform).

use nalgebra::{Matrix3, Rotation3, Vector3};

/// A rigid transform relating world coordinates to a shot's camera frame.
///
/// `p_camera = R * p_world + t`
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    /// Rotation from world to camera coordinates
    pub rotation: Matrix3<f64>,

    /// Translation from world to camera coordinates
    pub translation: Vector3<f64>,
}

impl Pose {
    pub fn new(rotation: Matrix3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Pose of a camera sitting at the world origin, looking down +z.
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// Build a pose from an axis-angle rotation vector and a translation.
    ///
    /// This is the on-disk encoding used by the reconstruction file: the
    /// rotation vector's direction is the axis, its norm the angle.
    pub fn from_axis_angle(rotation: &Vector3<f64>, translation: Vector3<f64>) -> Self {
        Self::new(Rotation3::new(*rotation).into_inner(), translation)
    }

    /// Transform a point from world coordinates to camera coordinates.
    pub fn transform(&self, point_world: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * point_world + self.translation
    }

    /// Camera origin in world coordinates: C = -R^T * t.
    pub fn origin(&self) -> Vector3<f64> {
        -self.rotation.transpose() * self.translation
    }
}
