//! Geometric correction applied to the exported scene.
//!
//! A corrections file is a small JSON document:
//!
//! ```json
//! {
//!     "offset": {"x": 10.0, "y": 0.0, "z": -2.5},
//!     "obb": {
//!         "min": {"x": -50.0, "y": -50.0, "z": -10.0},
//!         "max": {"x": 50.0, "y": 50.0, "z": 30.0}
//!     }
//! }
//! ```
//!
//! Every key is optional and defaults to zero independently; an absent file
//! means the identity correction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use nalgebra::Vector3;
use serde::Deserialize;

use crate::export::ExportError;

/// Translation offset and oriented bounding box for one export.
///
/// The offset is subtracted exactly once from every coordinate that leaves
/// the reconstruction frame (point coordinates and shot origins); rotations
/// are never touched. The obb corners pass through to the scene verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCorrection {
    pub offset: Vector3<f64>,
    pub obb_min: Vector3<f64>,
    pub obb_max: Vector3<f64>,
}

impl Default for SceneCorrection {
    fn default() -> Self {
        Self {
            offset: Vector3::zeros(),
            obb_min: Vector3::zeros(),
            obb_max: Vector3::zeros(),
        }
    }
}

// On-disk shape of the corrections document. Every field is optional so a
// partially specified file still parses.
#[derive(Debug, Default, Deserialize)]
struct CorrectionDoc {
    #[serde(default)]
    offset: Option<XyzDoc>,
    #[serde(default)]
    obb: Option<ObbDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct ObbDoc {
    #[serde(default)]
    min: Option<XyzDoc>,
    #[serde(default)]
    max: Option<XyzDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct XyzDoc {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
}

impl XyzDoc {
    fn vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

/// Parse the optional corrections file.
///
/// `None` (no file given) yields the identity correction. A present but
/// unparseable document is fatal and aborts the export before any phase
/// runs; missing keys are not an error.
pub fn load_correction(path: Option<&Path>) -> Result<SceneCorrection, ExportError> {
    let Some(path) = path else {
        return Ok(SceneCorrection::default());
    };

    let file = File::open(path)?;
    let doc: CorrectionDoc =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            ExportError::MalformedCorrection {
                path: path.to_path_buf(),
                source,
            }
        })?;

    let mut correction = SceneCorrection::default();
    if let Some(offset) = &doc.offset {
        correction.offset = offset.vector();
    }
    if let Some(obb) = &doc.obb {
        if let Some(min) = &obb.min {
            correction.obb_min = min.vector();
        }
        if let Some(max) = &obb.max {
            correction.obb_max = max.vector();
        }
    }
    Ok(correction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(contents: &str) -> Result<SceneCorrection, ExportError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        load_correction(Some(file.path()))
    }

    #[test]
    fn absent_file_is_identity_correction() {
        let correction = load_correction(None).unwrap();
        assert_eq!(correction, SceneCorrection::default());
    }

    #[test]
    fn full_document_overrides_everything() {
        let correction = load_str(
            r#"{
                "offset": {"x": 1.0, "y": 2.0, "z": 3.0},
                "obb": {
                    "min": {"x": -1.0, "y": -2.0, "z": -3.0},
                    "max": {"x": 4.0, "y": 5.0, "z": 6.0}
                }
            }"#,
        )
        .unwrap();

        assert_relative_eq!(correction.offset, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(correction.obb_min, Vector3::new(-1.0, -2.0, -3.0));
        assert_relative_eq!(correction.obb_max, Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn obb_min_and_max_are_independent() {
        let correction = load_str(r#"{"obb": {"max": {"x": 9.0, "y": 9.0, "z": 9.0}}}"#).unwrap();

        assert_relative_eq!(correction.obb_min, Vector3::zeros());
        assert_relative_eq!(correction.obb_max, Vector3::new(9.0, 9.0, 9.0));
        assert_relative_eq!(correction.offset, Vector3::zeros());
    }

    #[test]
    fn missing_axis_defaults_to_zero() {
        let correction = load_str(r#"{"offset": {"x": 7.5}}"#).unwrap();
        assert_relative_eq!(correction.offset, Vector3::new(7.5, 0.0, 0.0));
    }

    #[test]
    fn empty_document_is_identity_correction() {
        let correction = load_str("{}").unwrap();
        assert_eq!(correction, SceneCorrection::default());
    }

    #[test]
    fn malformed_document_is_fatal() {
        let err = load_str("not json at all").unwrap_err();
        assert!(matches!(err, ExportError::MalformedCorrection { .. }));
    }
}
