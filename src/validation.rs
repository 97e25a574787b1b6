//! Schema checks for COCO documents and YOLO labels.
//!
//! Violations that would corrupt training are errors; everything advisory
//! (zero-area boxes, missing masks, odd confidences) is a warning.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::coco::CocoDataset;
use crate::yolo_dataset::YoloAnnotation;

pub const COCO_TOP_LEVEL_KEYS: &[&str] = &["info", "licenses", "images", "annotations", "categories"];

/// Outcome of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// A failed report carrying a single error.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }

    fn error(&mut self, message: String) {
        self.errors.push(message);
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} errors, {} warnings)",
            if self.valid { "valid" } else { "invalid" },
            self.errors.len(),
            self.warnings.len()
        )
    }
}

/// Validate a typed COCO dataset.
pub fn validate_coco(dataset: &CocoDataset) -> ValidationReport {
    match serde_json::to_value(dataset) {
        Ok(value) => validate_coco_value(&value),
        Err(e) => ValidationReport::failed(format!("Dataset could not be serialized: {}", e)),
    }
}

/// Validate any COCO document, e.g. one read back from disk.
pub fn validate_coco_value(document: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();

    let Some(root) = document.as_object() else {
        report.error("COCO document must be a JSON object".to_string());
        return report.finish();
    };

    for key in COCO_TOP_LEVEL_KEYS {
        if !root.contains_key(*key) {
            report.error(format!("Missing required top-level key: {}", key));
        }
    }

    let categories = array_field(root.get("categories"), "categories", &mut report);
    let images = array_field(root.get("images"), "images", &mut report);
    let annotations = array_field(root.get("annotations"), "annotations", &mut report);

    let category_ids = check_categories(categories, &mut report);
    let image_ids = check_images(images, &mut report);
    check_annotations(annotations, &image_ids, &category_ids, &mut report);

    report.finish()
}

fn array_field<'a>(value: Option<&'a Value>, key: &str, report: &mut ValidationReport) -> &'a [Value] {
    match value {
        Some(Value::Array(items)) => items,
        Some(_) => {
            report.error(format!("Top-level key '{}' must be an array", key));
            &[]
        }
        None => &[],
    }
}

fn as_id(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64)
}

fn check_categories(categories: &[Value], report: &mut ValidationReport) -> HashSet<u64> {
    let mut ids = HashSet::new();
    let mut names: HashMap<&str, usize> = HashMap::new();

    for (index, category) in categories.iter().enumerate() {
        match as_id(category.get("id")) {
            Some(id) => {
                if !ids.insert(id) {
                    report.error(format!("Duplicate category id: {}", id));
                }
            }
            None => report.error(format!(
                "Category at index {} has no non-negative integer id",
                index
            )),
        }
        if let Some(name) = category.get("name").and_then(Value::as_str) {
            *names.entry(name).or_default() += 1;
        }
    }

    let mut duplicated: Vec<&str> = names
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    duplicated.sort_unstable();
    for name in duplicated {
        report.warn(format!("Duplicate category name: {}", name));
    }

    ids
}

fn check_images(images: &[Value], report: &mut ValidationReport) -> HashSet<u64> {
    let mut ids = HashSet::new();

    for (index, image) in images.iter().enumerate() {
        let label = match as_id(image.get("id")) {
            Some(id) => {
                if !ids.insert(id) {
                    report.error(format!("Duplicate image id: {}", id));
                }
                format!("Image {}", id)
            }
            None => {
                report.error(format!(
                    "Image at index {} has no non-negative integer id",
                    index
                ));
                format!("Image at index {}", index)
            }
        };

        for dimension in ["width", "height"] {
            match image.get(dimension).and_then(Value::as_f64) {
                Some(v) if v > 0.0 => {}
                _ => report.error(format!("{} has invalid {} (must be > 0)", label, dimension)),
            }
        }

        match image.get("file_name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => {}
            _ => report.error(format!("{} has an empty or missing file_name", label)),
        }
    }

    ids
}

fn check_annotations(
    annotations: &[Value],
    image_ids: &HashSet<u64>,
    category_ids: &HashSet<u64>,
    report: &mut ValidationReport,
) {
    let mut ids = HashSet::new();
    let mut empty_segmentations = 0usize;

    for (index, annotation) in annotations.iter().enumerate() {
        let label = match as_id(annotation.get("id")) {
            Some(id) => {
                if !ids.insert(id) {
                    report.error(format!("Duplicate annotation id: {}", id));
                }
                format!("Annotation {}", id)
            }
            None => {
                report.error(format!(
                    "Annotation at index {} has no non-negative integer id",
                    index
                ));
                format!("Annotation at index {}", index)
            }
        };

        match as_id(annotation.get("image_id")) {
            Some(image_id) if image_ids.contains(&image_id) => {}
            Some(image_id) => report.error(format!(
                "{} references unknown image_id {}",
                label, image_id
            )),
            None => report.error(format!("{} has an invalid image_id", label)),
        }

        match as_id(annotation.get("category_id")) {
            Some(category_id) if category_ids.contains(&category_id) => {}
            Some(category_id) => report.error(format!(
                "{} references unknown category_id {}",
                label, category_id
            )),
            None => report.error(format!("{} has an invalid category_id", label)),
        }

        check_bbox(annotation.get("bbox"), &label, report);

        match annotation.get("area").and_then(Value::as_f64) {
            Some(area) if area >= 0.0 => {}
            Some(area) => report.error(format!("{} has negative area {}", label, area)),
            None => report.error(format!("{} has a missing or non-numeric area", label)),
        }

        match annotation.get("segmentation") {
            None => empty_segmentations += 1,
            Some(Value::Array(polygons)) if polygons.is_empty() => empty_segmentations += 1,
            _ => {}
        }
    }

    if empty_segmentations > 0 {
        report.warn(format!(
            "{} annotations have an empty segmentation; pixel masks are not generated, boxes only",
            empty_segmentations
        ));
    }
}

fn check_bbox(bbox: Option<&Value>, label: &str, report: &mut ValidationReport) {
    let Some(Value::Array(values)) = bbox else {
        report.error(format!("{} has a missing or non-array bbox", label));
        return;
    };
    if values.len() != 4 {
        report.error(format!(
            "{} bbox must have exactly 4 elements, found {}",
            label,
            values.len()
        ));
        return;
    }
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if numbers.len() != 4 || numbers.iter().any(|v| !v.is_finite()) {
        report.error(format!("{} bbox contains non-numeric values", label));
        return;
    }

    let (width, height) = (numbers[2], numbers[3]);
    if width < 0.0 || height < 0.0 {
        report.error(format!(
            "{} bbox has negative size ({} x {})",
            label, width, height
        ));
    } else if width == 0.0 || height == 0.0 {
        report.warn(format!("{} bbox has zero area", label));
    }
}

/// Validate YOLO annotations against a registry of `num_categories` classes.
pub fn validate_yolo(annotations: &[YoloAnnotation], num_categories: usize) -> ValidationReport {
    let mut report = ValidationReport::new();
    let mut missing_confidence = 0usize;
    for (index, annotation) in annotations.iter().enumerate() {
        check_yolo_annotation(annotation, &format!("Annotation {}", index), num_categories, &mut report);
        if annotation.confidence.is_none() {
            missing_confidence += 1;
        }
    }
    if missing_confidence > 0 {
        report.warn(format!(
            "{} annotations have no confidence value",
            missing_confidence
        ));
    }
    report.finish()
}

/// Validate the text of a YOLO label file (`class x y w h` per line).
pub fn validate_yolo_label_text(text: &str, num_categories: usize) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let label = format!("Line {}", index + 1);
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 5 {
            report.error(format!(
                "{} must have 5 fields (class x_center y_center width height), found {}",
                label,
                tokens.len()
            ));
            continue;
        }

        let Ok(class_id) = tokens[0].parse::<u32>() else {
            report.error(format!("{} class id '{}' is not a non-negative integer", label, tokens[0]));
            continue;
        };

        let mut geometry = [0.0f64; 4];
        let mut numeric = true;
        for (slot, token) in geometry.iter_mut().zip(&tokens[1..]) {
            match token.parse::<f64>() {
                Ok(v) => *slot = v,
                Err(_) => {
                    report.error(format!("{} value '{}' is not numeric", label, token));
                    numeric = false;
                }
            }
        }
        if !numeric {
            continue;
        }

        let annotation = YoloAnnotation {
            class_id,
            x_center: geometry[0],
            y_center: geometry[1],
            width: geometry[2],
            height: geometry[3],
            confidence: None,
        };
        check_yolo_annotation(&annotation, &label, num_categories, &mut report);
    }

    report.finish()
}

fn check_yolo_annotation(
    annotation: &YoloAnnotation,
    label: &str,
    num_categories: usize,
    report: &mut ValidationReport,
) {
    if (annotation.class_id as usize) >= num_categories {
        report.error(format!(
            "{} class id {} is outside [0, {}]",
            label,
            annotation.class_id,
            num_categories as i64 - 1
        ));
    }

    let fields = [
        ("x_center", annotation.x_center),
        ("y_center", annotation.y_center),
        ("width", annotation.width),
        ("height", annotation.height),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            report.error(format!("{} {} is not a finite number", label, name));
        } else if !(0.0..=1.0).contains(&value) {
            report.error(format!("{} {} = {} is outside [0, 1]", label, name, value));
        }
    }

    if annotation.width == 0.0 || annotation.height == 0.0 {
        report.warn(format!("{} has zero width or height", label));
    }

    if let Some(confidence) = annotation.confidence {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            report.warn(format!("{} confidence {} is outside [0, 1]", label, confidence));
        }
    }
}
