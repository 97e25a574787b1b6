//! COCO format data structures
//!
//! Field names and nesting follow the COCO detection schema. Images and
//! annotations carry a few additive fields that strict COCO readers ignore.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{SessionMetadata, Vec3};

/// COCO dataset information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Info {
    pub year: i32,
    pub version: String,
    pub description: String,
    pub contributor: String,
    pub url: String,
    pub date_created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_id: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        let today = chrono::Utc::now().date_naive();
        Self {
            year: chrono::Datelike::year(&today),
            version: "1.0".to_string(),
            description: "Simulation ground truth export".to_string(),
            contributor: "gt2dataset".to_string(),
            url: String::new(),
            date_created: today.to_string(),
            simulation_id: None,
        }
    }
}

impl Info {
    pub fn from_metadata(metadata: &SessionMetadata) -> Self {
        let mut info = Info::default();
        if !metadata.engine_version.is_empty() {
            info.version = metadata.engine_version.clone();
        }
        if !metadata.simulation_id.is_empty() {
            info.description = format!(
                "Simulation ground truth export ({})",
                metadata.simulation_id
            );
            info.simulation_id = Some(metadata.simulation_id.clone());
        }
        info
    }
}

/// COCO license information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct License {
    pub id: u32,
    pub name: String,
    pub url: String,
}

impl Default for License {
    fn default() -> Self {
        Self {
            id: 1,
            name: "Unknown".to_string(),
            url: String::new(),
        }
    }
}

/// COCO category information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

/// COCO image information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub id: u64,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub license: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_captured: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_intrinsics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_extrinsics: Option<Value>,
}

impl Image {
    pub fn new(id: u64, file_name: String, width: u32, height: u32) -> Self {
        Self {
            id,
            file_name,
            width,
            height,
            license: 1,
            date_captured: None,
            frame_number: None,
            timestamp: None,
            camera_intrinsics: None,
            camera_extrinsics: None,
        }
    }
}

/// Simulation state attached to every annotation, beyond the 2-D box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundTruthAttributes {
    pub pose_3d: PoseAttributes,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub distance_from_camera: f64,
    pub occlusion_level: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoseAttributes {
    pub position: Vec3,
    pub rotation: Vec3,
}

/// COCO annotation information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub id: u64,
    pub image_id: u64,
    pub category_id: u32,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub area: f64,
    // Always empty: no pixel masks are synthesized
    pub segmentation: Vec<Vec<f64>>,
    pub iscrowd: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<GroundTruthAttributes>,
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CocoDataset {
    pub info: Info,
    pub licenses: Vec<License>,
    pub images: Vec<Image>,
    pub annotations: Vec<Annotation>,
    pub categories: Vec<Category>,
}

impl Default for CocoDataset {
    fn default() -> Self {
        Self {
            info: Info::default(),
            licenses: vec![License::default()],
            images: Vec::new(),
            annotations: Vec::new(),
            categories: Vec::new(),
        }
    }
}
