use crate::types::{BoundingBox2D, Resolution, SceneObject};

/// Inclusion filter shared by every exporter: the object must be inside the
/// camera frustum and carry a strictly positive detection confidence.
pub fn is_exportable(object: &SceneObject) -> bool {
    object.in_frustum && object.bounding_box_2d.confidence > 0.0
}

/// Iterate the objects of a frame that pass [`is_exportable`].
pub fn exportable_objects(objects: &[SceneObject]) -> impl Iterator<Item = &SceneObject> {
    objects.iter().filter(|object| is_exportable(object))
}

/// COCO box: `[x, y, width, height]` in pixels, plus its area.
pub fn coco_bbox(bbox: &BoundingBox2D) -> ([f64; 4], f64) {
    let width = bbox.width();
    let height = bbox.height();
    ([bbox.x_min, bbox.y_min, width, height], width * height)
}

/// YOLO box: `(x_center, y_center, width, height)` normalized by the frame resolution.
pub fn calculate_bounding_box(bbox: &BoundingBox2D, resolution: Resolution) -> (f64, f64, f64, f64) {
    let image_width = resolution.width as f64;
    let image_height = resolution.height as f64;
    let width = bbox.width();
    let height = bbox.height();

    let x_center = (bbox.x_min + width / 2.0) / image_width;
    let y_center = (bbox.y_min + height / 2.0) / image_height;

    (x_center, y_center, width / image_width, height / image_height)
}

/// File stem shared by the COCO image name and the YOLO label file.
pub fn frame_stem(frame_number: u64) -> String {
    format!("frame_{:06}", frame_number)
}
