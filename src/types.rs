use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current version of the frame record layout.
pub const FRAME_RECORD_VERSION: u32 = 1;

fn default_record_version() -> u32 {
    FRAME_RECORD_VERSION
}

// A plain 3-component vector (positions, velocities, euler rotations)
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// 3-D pose of a scene object
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Vec3,
}

/// Screen-space bounding box in pixels, as produced by the renderer.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox2D {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub confidence: f64,
}

impl BoundingBox2D {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Camera intrinsics. Only the resolution is interpreted; everything else
/// (focal length, principal point, ...) is carried through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Intrinsics {
    pub resolution: Resolution,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CameraData {
    pub intrinsics: Intrinsics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrinsics: Option<Value>,
}

// One object in the simulated scene
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub class: String,
    pub pose: Pose,
    pub velocity: Vec3,
    /// Missing in older recordings; see [`SceneObject::angular_velocity_or_zero`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angular_velocity: Option<Vec3>,
    #[serde(rename = "boundingBox2D")]
    pub bounding_box_2d: BoundingBox2D,
    pub in_frustum: bool,
    pub distance_from_camera: f64,
    pub occlusion_level: f64,
}

impl SceneObject {
    pub fn angular_velocity_or_zero(&self) -> Vec3 {
        self.angular_velocity.unwrap_or(Vec3::ZERO)
    }
}

/// One timestamped ground-truth snapshot of the simulation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroundTruthFrame {
    #[serde(default = "default_record_version")]
    pub version: u32,
    pub frame_number: u64,
    pub timestamp: f64,
    pub camera: CameraData,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
}

impl GroundTruthFrame {
    pub fn resolution(&self) -> Resolution {
        self.camera.intrinsics.resolution
    }
}

// Session-level metadata, not repeated per frame
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub simulation_id: String,
    pub engine_version: String,
}

/// A full recording as handed over by the capture side.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Recording {
    #[serde(default)]
    pub metadata: SessionMetadata,
    pub frames: Vec<GroundTruthFrame>,
}

/// Particle and group identifiers show up both as numbers and as strings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ParticleKey {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for ParticleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticleKey::Number(n) => write!(f, "{}", n),
            ParticleKey::Text(s) => f.write_str(s),
        }
    }
}

/// Raw per-particle physics state used by the legacy CSV export.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Particle {
    pub id: ParticleKey,
    pub group_id: ParticleKey,
    pub shape: String,
    pub mass: f64,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angular_velocity: Option<Vec3>,
}
