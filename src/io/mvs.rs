//! Binary scene format for the dense reconstruction stage.
//!
//! File format: `.mvs`
//!
//! Layout (little-endian):
//! ```text
//! Header:
//!   - Magic: "MVSSCENE" (8 bytes)
//!   - Version: u32
//!   - Obb min: 3 × f64
//!   - Obb max: 3 × f64
//!
//! Cameras (u64 count, then per camera):
//!   - id: string
//!   - K: 9 × f64, row-major
//!   - width, height: u32
//!
//! Shots (u64 count, then per shot):
//!   - image path, mask path, shot id, camera id: strings
//!   - rotation: 9 × f64, row-major
//!   - origin: 3 × f64
//!
//! Points (u64 count, then per point):
//!   - coordinates: 3 × f64
//!   - observer count: u32, then observer shot ids as strings
//! ```
//!
//! Strings are u32 length-prefixed UTF-8.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::{Matrix3, Vector3};

use crate::io::LoadError;

const MAGIC: &[u8; 8] = b"MVSSCENE";
const VERSION: u32 = 1;

// Upper bound for length-prefixed strings when reading; anything larger is
// a corrupt file, not a real path or id.
const MAX_STRING_LEN: u32 = 64 * 1024;

/// Receives the scene graph one element at a time and persists it.
///
/// The exporter makes these calls in a fixed order per export: cameras,
/// then shots, then points, then the bounding box and a single `export`.
pub trait SceneSink {
    fn set_obb_min(&mut self, x: f64, y: f64, z: f64);
    fn set_obb_max(&mut self, x: f64, y: f64, z: f64);
    fn add_camera(&mut self, id: &str, k: &Matrix3<f64>, width: u32, height: u32);
    fn add_shot(
        &mut self,
        image_path: &str,
        mask_path: &str,
        shot_id: &str,
        camera_id: &str,
        rotation: &Matrix3<f64>,
        origin: &Vector3<f64>,
    );
    fn add_point(&mut self, coordinates: &Vector3<f64>, observers: &[String]);
    fn export(&mut self, path: &Path) -> io::Result<()>;
}

/// An exported camera: id, intrinsic matrix and image dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCamera {
    pub id: String,
    pub k: Matrix3<f64>,
    pub width: u32,
    pub height: u32,
}

/// An exported shot: file references, owning camera and corrected pose.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneShot {
    pub image_path: String,
    pub mask_path: String,
    pub id: String,
    pub camera_id: String,
    pub rotation: Matrix3<f64>,
    pub origin: Vector3<f64>,
}

/// An exported point: corrected coordinates and surviving observers.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePoint {
    pub coordinates: Vector3<f64>,
    pub observers: Vec<String>,
}

/// The in-memory scene graph assembled during one export and written to
/// disk in a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MvsScene {
    pub obb_min: Vector3<f64>,
    pub obb_max: Vector3<f64>,
    pub cameras: Vec<SceneCamera>,
    pub shots: Vec<SceneShot>,
    pub points: Vec<ScenePoint>,
}

impl Default for MvsScene {
    fn default() -> Self {
        Self {
            obb_min: Vector3::zeros(),
            obb_max: Vector3::zeros(),
            cameras: Vec::new(),
            shots: Vec::new(),
            points: Vec::new(),
        }
    }
}

impl MvsScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u32::<LittleEndian>(VERSION)?;
        write_vector(writer, &self.obb_min)?;
        write_vector(writer, &self.obb_max)?;

        writer.write_u64::<LittleEndian>(self.cameras.len() as u64)?;
        for camera in &self.cameras {
            write_string(writer, &camera.id)?;
            write_matrix(writer, &camera.k)?;
            writer.write_u32::<LittleEndian>(camera.width)?;
            writer.write_u32::<LittleEndian>(camera.height)?;
        }

        writer.write_u64::<LittleEndian>(self.shots.len() as u64)?;
        for shot in &self.shots {
            write_string(writer, &shot.image_path)?;
            write_string(writer, &shot.mask_path)?;
            write_string(writer, &shot.id)?;
            write_string(writer, &shot.camera_id)?;
            write_matrix(writer, &shot.rotation)?;
            write_vector(writer, &shot.origin)?;
        }

        writer.write_u64::<LittleEndian>(self.points.len() as u64)?;
        for point in &self.points {
            write_vector(writer, &point.coordinates)?;
            writer.write_u32::<LittleEndian>(point.observers.len() as u32)?;
            for observer in &point.observers {
                write_string(writer, observer)?;
            }
        }

        Ok(())
    }
}

impl SceneSink for MvsScene {
    fn set_obb_min(&mut self, x: f64, y: f64, z: f64) {
        self.obb_min = Vector3::new(x, y, z);
    }

    fn set_obb_max(&mut self, x: f64, y: f64, z: f64) {
        self.obb_max = Vector3::new(x, y, z);
    }

    fn add_camera(&mut self, id: &str, k: &Matrix3<f64>, width: u32, height: u32) {
        self.cameras.push(SceneCamera {
            id: id.to_string(),
            k: *k,
            width,
            height,
        });
    }

    fn add_shot(
        &mut self,
        image_path: &str,
        mask_path: &str,
        shot_id: &str,
        camera_id: &str,
        rotation: &Matrix3<f64>,
        origin: &Vector3<f64>,
    ) {
        self.shots.push(SceneShot {
            image_path: image_path.to_string(),
            mask_path: mask_path.to_string(),
            id: shot_id.to_string(),
            camera_id: camera_id.to_string(),
            rotation: *rotation,
            origin: *origin,
        });
    }

    fn add_point(&mut self, coordinates: &Vector3<f64>, observers: &[String]) {
        self.points.push(ScenePoint {
            coordinates: *coordinates,
            observers: observers.to_vec(),
        });
    }

    fn export(&mut self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()
    }
}

/// Load a scene file back into memory.
pub fn read_scene(path: &Path) -> Result<MvsScene, LoadError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(LoadError::InvalidFormat(
            "invalid file magic (not a .mvs scene)".to_string(),
        ));
    }
    let version = reader.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(LoadError::InvalidFormat(format!(
            "unsupported scene version: {version}"
        )));
    }

    let mut scene = MvsScene::new();
    scene.obb_min = read_vector(&mut reader)?;
    scene.obb_max = read_vector(&mut reader)?;

    let num_cameras = reader.read_u64::<LittleEndian>()?;
    for _ in 0..num_cameras {
        let id = read_string(&mut reader)?;
        let k = read_matrix(&mut reader)?;
        let width = reader.read_u32::<LittleEndian>()?;
        let height = reader.read_u32::<LittleEndian>()?;
        scene.cameras.push(SceneCamera {
            id,
            k,
            width,
            height,
        });
    }

    let num_shots = reader.read_u64::<LittleEndian>()?;
    for _ in 0..num_shots {
        let image_path = read_string(&mut reader)?;
        let mask_path = read_string(&mut reader)?;
        let id = read_string(&mut reader)?;
        let camera_id = read_string(&mut reader)?;
        let rotation = read_matrix(&mut reader)?;
        let origin = read_vector(&mut reader)?;
        scene.shots.push(SceneShot {
            image_path,
            mask_path,
            id,
            camera_id,
            rotation,
            origin,
        });
    }

    let num_points = reader.read_u64::<LittleEndian>()?;
    for _ in 0..num_points {
        let coordinates = read_vector(&mut reader)?;
        let num_observers = reader.read_u32::<LittleEndian>()?;
        let mut observers = Vec::with_capacity(num_observers as usize);
        for _ in 0..num_observers {
            observers.push(read_string(&mut reader)?);
        }
        scene.points.push(ScenePoint {
            coordinates,
            observers,
        });
    }

    Ok(scene)
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(s.len() as u32)?;
    writer.write_all(s.as_bytes())
}

fn write_vector<W: Write>(writer: &mut W, v: &Vector3<f64>) -> io::Result<()> {
    writer.write_f64::<LittleEndian>(v.x)?;
    writer.write_f64::<LittleEndian>(v.y)?;
    writer.write_f64::<LittleEndian>(v.z)
}

fn write_matrix<W: Write>(writer: &mut W, m: &Matrix3<f64>) -> io::Result<()> {
    for row in 0..3 {
        for col in 0..3 {
            writer.write_f64::<LittleEndian>(m[(row, col)])?;
        }
    }
    Ok(())
}

fn read_string<R: Read>(reader: &mut R) -> Result<String, LoadError> {
    let len = reader.read_u32::<LittleEndian>()?;
    if len > MAX_STRING_LEN {
        return Err(LoadError::InvalidFormat(format!(
            "string length {len} exceeds limit"
        )));
    }
    let mut bytes = vec![0u8; len as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| LoadError::InvalidFormat(format!("invalid UTF-8 in string: {e}")))
}

fn read_vector<R: Read>(reader: &mut R) -> Result<Vector3<f64>, LoadError> {
    let x = reader.read_f64::<LittleEndian>()?;
    let y = reader.read_f64::<LittleEndian>()?;
    let z = reader.read_f64::<LittleEndian>()?;
    Ok(Vector3::new(x, y, z))
}

fn read_matrix<R: Read>(reader: &mut R) -> Result<Matrix3<f64>, LoadError> {
    let mut values = [0.0f64; 9];
    for value in &mut values {
        *value = reader.read_f64::<LittleEndian>()?;
    }
    // Row-major on disk; Matrix3::new takes row-major arguments.
    Ok(Matrix3::new(
        values[0], values[1], values[2], values[3], values[4], values[5], values[6], values[7],
        values[8],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_scene() -> MvsScene {
        let mut scene = MvsScene::new();
        scene.set_obb_min(-1.0, -2.0, -3.0);
        scene.set_obb_max(1.0, 2.0, 3.0);
        scene.add_camera(
            "cam1",
            &Matrix3::new(800.0, 0.0, 499.5, 0.0, 800.0, 399.5, 0.0, 0.0, 1.0),
            1000,
            800,
        );
        scene.add_shot(
            "/data/images/im1.jpg",
            "",
            "im1.jpg",
            "cam1",
            &Matrix3::identity(),
            &Vector3::new(-1.0, 0.0, 0.0),
        );
        scene.add_point(
            &Vector3::new(0.5, -0.5, 4.0),
            &["im1.jpg".to_string()],
        );
        scene
    }

    #[test]
    fn written_scene_reads_back_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scene.mvs");

        let mut scene = sample_scene();
        scene.export(&path).unwrap();

        let loaded = read_scene(&path).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scene.mvs");
        std::fs::write(&path, b"NOTASCENE_______").unwrap();

        let err = read_scene(&path).unwrap_err();
        assert!(matches!(err, LoadError::InvalidFormat(_)));
    }
}
