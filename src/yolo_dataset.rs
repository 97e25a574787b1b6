//! YOLO dataset conversion
//!
//! Produces normalized, center-based boxes per frame plus the `classes.txt`
//! and `data.yaml` manifests.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::categories::CategoryRegistry;
use crate::config::ExportConfig;
use crate::conversion::{calculate_bounding_box, exportable_objects, frame_stem};
use crate::types::GroundTruthFrame;

/// One YOLO label row. Geometry is normalized to the frame resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoloAnnotation {
    pub class_id: u32,
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
    /// Advisory only, never written to label files.
    pub confidence: Option<f64>,
}

impl YoloAnnotation {
    pub fn to_label_line(&self) -> String {
        format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.x_center, self.y_center, self.width, self.height
        )
    }
}

/// Label file for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloLabelFile {
    pub frame_number: u64,
    pub file_name: String,
    pub annotations: Vec<YoloAnnotation>,
}

impl YoloLabelFile {
    pub fn contents(&self) -> String {
        let mut yolo_data = String::with_capacity(self.annotations.len() * 48);
        for annotation in &self.annotations {
            yolo_data.push_str(&annotation.to_label_line());
            yolo_data.push('\n');
        }
        yolo_data
    }
}

/// Everything a YOLO export consists of, still in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloDataset {
    pub label_files: Vec<YoloLabelFile>,
    pub classes_txt: String,
    pub data_yaml: String,
}

impl YoloDataset {
    pub fn annotation_count(&self) -> usize {
        self.label_files.iter().map(|f| f.annotations.len()).sum()
    }
}

/// Convert the exportable objects of one frame into YOLO annotations.
pub fn convert_frame(frame: &GroundTruthFrame, registry: &CategoryRegistry) -> Vec<YoloAnnotation> {
    let resolution = frame.resolution();
    exportable_objects(&frame.objects)
        .map(|object| {
            let (x_center, y_center, width, height) =
                calculate_bounding_box(&object.bounding_box_2d, resolution);
            YoloAnnotation {
                class_id: registry.class_name_to_id(&object.class),
                x_center,
                y_center,
                width,
                height,
                confidence: Some(object.bounding_box_2d.confidence),
            }
        })
        .collect()
}

/// Convert a frame sequence into label files and manifests, keeping frame order.
pub fn convert_sequence(
    frames: &[GroundTruthFrame],
    registry: &CategoryRegistry,
    config: &ExportConfig,
) -> YoloDataset {
    let label_files: Vec<YoloLabelFile> = frames
        .par_iter()
        .map(|frame| YoloLabelFile {
            frame_number: frame.frame_number,
            file_name: format!("{}.txt", frame_stem(frame.frame_number)),
            annotations: convert_frame(frame, registry),
        })
        .collect();

    YoloDataset {
        label_files,
        classes_txt: create_classes_txt(registry),
        data_yaml: create_dataset_yaml(registry, config),
    }
}

/// One category name per line, in registry order.
pub fn create_classes_txt(registry: &CategoryRegistry) -> String {
    let mut classes = String::new();
    for name in registry.names() {
        classes.push_str(name);
        classes.push('\n');
    }
    classes
}

/// Training manifest declaring the image directories and the class list.
pub fn create_dataset_yaml(registry: &CategoryRegistry, config: &ExportConfig) -> String {
    let names: Vec<String> = registry.names().map(yaml_single_quoted).collect();
    format!(
        "path: {}\ntrain: {}\nval: {}\n\nnc: {}\nnames: [{}]\n",
        config.dataset_root,
        config.train_dir,
        config.val_dir,
        registry.len(),
        names.join(", ")
    )
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}
