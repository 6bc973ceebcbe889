//! Camera model (intrinsic parameters of a reconstruction camera).
//!
//! Cameras are used to:
//! - Derive the pinhole intrinsic matrix handed to the dense stage
//! - Decide which shots are exportable (perspective projection only)

use nalgebra::Matrix3;
use serde::Deserialize;

/// Projection model of a camera.
///
/// The export pipeline only handles perspective cameras; every other model
/// (fisheye, spherical, brown, ...) collapses into `Unsupported` and is
/// skipped during export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionType {
    Perspective,
    #[serde(other)]
    Unsupported,
}

/// Intrinsic parameters of a camera, as stored in a reconstruction.
///
/// The camera id lives in the owning reconstruction's map, not here.
#[derive(Debug, Clone, Deserialize)]
pub struct Camera {
    /// Projection model tag.
    pub projection_type: ProjectionType,

    /// Focal length, normalized by the larger image dimension.
    ///
    /// Some models (e.g. spherical) carry no focal length at all, hence the
    /// zero default.
    #[serde(default)]
    pub focal: f64,

    /// Image width (pixels)
    pub width: u32,

    /// Image height (pixels)
    pub height: u32,
}

impl Camera {
    pub fn is_perspective(&self) -> bool {
        self.projection_type == ProjectionType::Perspective
    }

    /// Derive the pinhole intrinsic matrix.
    ///
    /// For a perspective camera with normalized focal `f` and dimensions
    /// `(w, h)`:
    ///
    /// ```text
    /// K = | f*max(w,h)     0       (w-1)/2 |
    ///     |     0      f*max(w,h)  (h-1)/2 |
    ///     |     0          0          1    |
    /// ```
    ///
    /// Returns `None` for every other projection model; such cameras are
    /// excluded from the exported scene along with their shots.
    pub fn intrinsic_matrix(&self) -> Option<Matrix3<f64>> {
        if !self.is_perspective() {
            return None;
        }

        let w = self.width as f64;
        let h = self.height as f64;
        let f = self.focal * w.max(h);

        Some(Matrix3::new(
            f,
            0.0,
            (w - 1.0) / 2.0,
            0.0,
            f,
            (h - 1.0) / 2.0,
            0.0,
            0.0,
            1.0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn perspective(focal: f64, width: u32, height: u32) -> Camera {
        Camera {
            projection_type: ProjectionType::Perspective,
            focal,
            width,
            height,
        }
    }

    #[test]
    fn intrinsic_matrix_scales_focal_by_larger_dimension() {
        let camera = perspective(0.8, 1000, 800);
        let k = camera.intrinsic_matrix().expect("perspective camera has K");

        assert_relative_eq!(k[(0, 0)], 800.0);
        assert_relative_eq!(k[(1, 1)], 800.0);
        assert_relative_eq!(k[(0, 2)], 499.5);
        assert_relative_eq!(k[(1, 2)], 399.5);
        assert_relative_eq!(k[(2, 2)], 1.0);
        assert_relative_eq!(k[(1, 0)], 0.0);
    }

    #[test]
    fn intrinsic_matrix_uses_height_when_portrait() {
        let camera = perspective(0.5, 600, 1200);
        let k = camera.intrinsic_matrix().unwrap();

        assert_relative_eq!(k[(0, 0)], 600.0);
        assert_relative_eq!(k[(0, 2)], 299.5);
        assert_relative_eq!(k[(1, 2)], 599.5);
    }

    #[test]
    fn non_perspective_camera_has_no_intrinsic_matrix() {
        let camera = Camera {
            projection_type: ProjectionType::Unsupported,
            focal: 0.7,
            width: 640,
            height: 480,
        };
        assert!(camera.intrinsic_matrix().is_none());
    }

    #[test]
    fn unknown_projection_tags_deserialize_as_unsupported() {
        let camera: Camera = serde_json::from_str(
            r#"{"projection_type": "spherical", "width": 2048, "height": 1024}"#,
        )
        .unwrap();
        assert_eq!(camera.projection_type, ProjectionType::Unsupported);
        assert_relative_eq!(camera.focal, 0.0);
    }
}
