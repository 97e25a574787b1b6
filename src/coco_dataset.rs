//! COCO dataset conversion
//!
//! Turns buffered ground-truth frames into COCO images and annotations.

use log::debug;
use serde_json::Value;

use crate::categories::CategoryRegistry;
use crate::coco::{Annotation, CocoDataset, GroundTruthAttributes, Image, Info, PoseAttributes};
use crate::conversion::{coco_bbox, exportable_objects, frame_stem};
use crate::session::AnnotationIdCounter;
use crate::types::{GroundTruthFrame, SceneObject, SessionMetadata};

/// Convert a single frame into its COCO image and annotations.
///
/// Annotation ids are drawn from `annotation_ids`, so consecutive calls keep
/// producing unique ids.
pub fn convert_frame(
    frame: &GroundTruthFrame,
    image_id: u64,
    registry: &CategoryRegistry,
    annotation_ids: &mut AnnotationIdCounter,
) -> (Image, Vec<Annotation>) {
    let image = build_image(frame, image_id);

    let annotations: Vec<Annotation> = exportable_objects(&frame.objects)
        .map(|object| {
            convert_object(
                object,
                annotation_ids.next_id(),
                image_id,
                registry.class_name_to_id(&object.class),
            )
        })
        .collect();

    debug!(
        "Frame {} -> image {} with {} annotations",
        frame.frame_number,
        image_id,
        annotations.len()
    );

    (image, annotations)
}

/// Convert a frame sequence into a complete COCO dataset.
///
/// Image ids are the zero-based position of each frame in `frames`.
pub fn convert_sequence(
    frames: &[GroundTruthFrame],
    registry: &CategoryRegistry,
    metadata: &SessionMetadata,
    annotation_ids: &mut AnnotationIdCounter,
) -> CocoDataset {
    let mut images = Vec::with_capacity(frames.len());
    let mut annotations = Vec::new();

    for (index, frame) in frames.iter().enumerate() {
        let (image, frame_annotations) =
            convert_frame(frame, index as u64, registry, annotation_ids);
        images.push(image);
        annotations.extend(frame_annotations);
    }

    CocoDataset {
        info: Info::from_metadata(metadata),
        images,
        annotations,
        categories: registry.categories().to_vec(),
        ..CocoDataset::default()
    }
}

fn build_image(frame: &GroundTruthFrame, image_id: u64) -> Image {
    let resolution = frame.resolution();
    let mut image = Image::new(
        image_id,
        format!("{}.png", frame_stem(frame.frame_number)),
        resolution.width,
        resolution.height,
    );
    image.date_captured = date_captured(frame.timestamp);
    image.frame_number = Some(frame.frame_number);
    image.timestamp = Some(frame.timestamp);

    let intrinsics = &frame.camera.intrinsics.extra;
    if !intrinsics.is_empty() {
        image.camera_intrinsics = Some(Value::Object(intrinsics.clone()));
    }
    image.camera_extrinsics = frame.camera.extrinsics.clone();
    image
}

fn convert_object(object: &SceneObject, id: u64, image_id: u64, category_id: u32) -> Annotation {
    let (bbox, area) = coco_bbox(&object.bounding_box_2d);

    Annotation {
        id,
        image_id,
        category_id,
        bbox,
        area,
        segmentation: Vec::new(),
        iscrowd: 0,
        ground_truth: Some(GroundTruthAttributes {
            pose_3d: PoseAttributes {
                position: object.pose.position,
                rotation: object.pose.rotation,
            },
            velocity: object.velocity,
            angular_velocity: object.angular_velocity_or_zero(),
            distance_from_camera: object.distance_from_camera,
            occlusion_level: object.occlusion_level,
        }),
    }
}

// Frame timestamps are epoch milliseconds; anything else is left out
fn date_captured(timestamp: f64) -> Option<String> {
    if !timestamp.is_finite() || timestamp < 0.0 {
        return None;
    }
    chrono::DateTime::from_timestamp_millis(timestamp as i64).map(|dt| dt.to_rfc3339())
}
