use gt2dataset::categories::{CategoryRegistry, BUILTIN_CATEGORIES, FALLBACK_CATEGORY_ID};
use gt2dataset::coco_dataset;
use gt2dataset::config::ExportConfig;
use gt2dataset::conversion::{calculate_bounding_box, is_exportable};
use gt2dataset::particle_csv::{particles_to_csv, CSV_HEADER};
use gt2dataset::session::AnnotationIdCounter;
use gt2dataset::types::{
    BoundingBox2D, CameraData, GroundTruthFrame, Intrinsics, Particle, ParticleKey, Pose,
    Resolution, SceneObject, SessionMetadata, Vec3,
};
use gt2dataset::validation::{validate_coco, validate_coco_value, validate_yolo, validate_yolo_label_text};
use gt2dataset::yolo_dataset::{self, YoloAnnotation};
use serde_json::json;

const EPS: f64 = 1e-9;

fn object(class: &str, bbox: (f64, f64, f64, f64), confidence: f64, in_frustum: bool) -> SceneObject {
    let (x_min, y_min, x_max, y_max) = bbox;
    SceneObject {
        class: class.to_string(),
        pose: Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::ZERO,
        },
        velocity: Vec3::new(0.5, 0.0, 0.0),
        angular_velocity: None,
        bounding_box_2d: BoundingBox2D {
            x_min,
            x_max,
            y_min,
            y_max,
            confidence,
        },
        in_frustum,
        distance_from_camera: 4.2,
        occlusion_level: 0.1,
    }
}

fn frame(frame_number: u64, objects: Vec<SceneObject>) -> GroundTruthFrame {
    GroundTruthFrame {
        version: 1,
        frame_number,
        timestamp: 1_700_000_000_000.0,
        camera: CameraData {
            intrinsics: Intrinsics {
                resolution: Resolution {
                    width: 640,
                    height: 480,
                },
                extra: serde_json::Map::new(),
            },
            extrinsics: None,
        },
        objects,
    }
}

fn scenario_object() -> SceneObject {
    object("sphere", (10.0, 10.0, 50.0, 60.0), 0.9, true)
}

#[test]
fn test_registry_exact_match_and_fallback() {
    let registry = CategoryRegistry::builtin();
    assert_eq!(registry.len(), BUILTIN_CATEGORIES.len());
    assert_eq!(registry.class_name_to_id("box"), 0);
    assert_eq!(registry.class_name_to_id("sphere"), 1);
    assert_eq!(registry.class_name_to_id("icosahedron"), 9);
    assert_eq!(registry.class_name_to_id("Sphere"), FALLBACK_CATEGORY_ID);
    assert_eq!(registry.class_name_to_id("spaceship"), FALLBACK_CATEGORY_ID);
    assert_eq!(registry.class_name_to_id(""), FALLBACK_CATEGORY_ID);
}

#[test]
fn test_registry_ids_follow_order() {
    let registry = CategoryRegistry::from_pairs(&[("a", "x"), ("b", "x"), ("c", "y")], 2);
    let ids: Vec<u32> = registry.categories().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(registry.class_name_to_id("zzz"), 2);
}

#[test]
fn test_inclusion_filter() {
    assert!(is_exportable(&object("box", (0.0, 0.0, 1.0, 1.0), 0.5, true)));
    assert!(is_exportable(&object("box", (0.0, 0.0, 1.0, 1.0), 1e-6, true)));
    assert!(!is_exportable(&object("box", (0.0, 0.0, 1.0, 1.0), 0.0, true)));
    assert!(!is_exportable(&object("box", (0.0, 0.0, 1.0, 1.0), -0.3, true)));
    assert!(!is_exportable(&object("box", (0.0, 0.0, 1.0, 1.0), 0.9, false)));
}

#[test]
fn test_calculate_bounding_box() {
    let bbox = scenario_object().bounding_box_2d;
    let (x_center, y_center, width, height) = calculate_bounding_box(
        &bbox,
        Resolution {
            width: 640,
            height: 480,
        },
    );

    assert!((x_center - 0.046875).abs() < EPS);
    assert!((y_center - 35.0 / 480.0).abs() < EPS);
    assert!((width - 0.0625).abs() < EPS);
    assert!((height - 50.0 / 480.0).abs() < EPS);
}

#[test]
fn test_coco_convert_frame_scenario() {
    let registry = CategoryRegistry::builtin();
    let mut ids = AnnotationIdCounter::new();
    let (image, annotations) =
        coco_dataset::convert_frame(&frame(7, vec![scenario_object()]), 0, registry, &mut ids);

    assert_eq!(image.id, 0);
    assert_eq!(image.file_name, "frame_000007.png");
    assert_eq!((image.width, image.height), (640, 480));
    assert_eq!(image.timestamp, Some(1_700_000_000_000.0));
    assert!(image.date_captured.is_some());

    assert_eq!(annotations.len(), 1);
    let annotation = &annotations[0];
    assert_eq!(annotation.id, 0);
    assert_eq!(annotation.image_id, 0);
    assert_eq!(annotation.category_id, 1);
    assert_eq!(annotation.bbox, [10.0, 10.0, 40.0, 50.0]);
    assert_eq!(annotation.area, 2000.0);
    assert!(annotation.segmentation.is_empty());
    assert_eq!(annotation.iscrowd, 0);

    let attributes = annotation.ground_truth.as_ref().unwrap();
    assert_eq!(attributes.pose_3d.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(attributes.angular_velocity, Vec3::ZERO);
    assert_eq!(attributes.distance_from_camera, 4.2);
}

#[test]
fn test_coco_excludes_culled_and_zero_confidence_objects() {
    let registry = CategoryRegistry::builtin();
    let mut ids = AnnotationIdCounter::new();
    let objects = vec![
        object("box", (0.0, 0.0, 10.0, 10.0), 0.0, true),
        object("box", (0.0, 0.0, 10.0, 10.0), 0.8, false),
        object("cone", (5.0, 5.0, 15.0, 25.0), 0.8, true),
    ];
    let (_, annotations) = coco_dataset::convert_frame(&frame(0, objects), 3, registry, &mut ids);

    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].category_id, 3);
    assert_eq!(annotations[0].image_id, 3);
    assert_eq!(ids.peek(), 1);
}

#[test]
fn test_coco_sequence_assigns_ids_by_position() {
    let registry = CategoryRegistry::builtin();
    let mut ids = AnnotationIdCounter::new();
    let frames = vec![frame(0, vec![scenario_object()]), frame(0, vec![scenario_object()])];
    let dataset =
        coco_dataset::convert_sequence(&frames, registry, &SessionMetadata::default(), &mut ids);

    assert_eq!(dataset.images.len(), 2);
    assert_eq!(dataset.annotations.len(), 2);
    let image_ids: Vec<u64> = dataset.images.iter().map(|i| i.id).collect();
    let annotation_ids: Vec<u64> = dataset.annotations.iter().map(|a| a.id).collect();
    let referenced: Vec<u64> = dataset.annotations.iter().map(|a| a.image_id).collect();
    assert_eq!(image_ids, vec![0, 1]);
    assert_eq!(annotation_ids, vec![0, 1]);
    assert_eq!(referenced, vec![0, 1]);
    assert_eq!(dataset.categories.len(), BUILTIN_CATEGORIES.len());
    assert!(validate_coco(&dataset).valid);
}

#[test]
fn test_coco_sequence_continues_counter() {
    let registry = CategoryRegistry::builtin();
    let mut ids = AnnotationIdCounter::starting_at(5);
    let frames = vec![frame(0, vec![scenario_object(), scenario_object()])];
    let dataset =
        coco_dataset::convert_sequence(&frames, registry, &SessionMetadata::default(), &mut ids);

    let annotation_ids: Vec<u64> = dataset.annotations.iter().map(|a| a.id).collect();
    assert_eq!(annotation_ids, vec![5, 6]);
    assert_eq!(ids.peek(), 7);
}

#[test]
fn test_coco_info_uses_session_metadata() {
    let registry = CategoryRegistry::builtin();
    let metadata = SessionMetadata {
        simulation_id: "sim-42".to_string(),
        engine_version: "3.1.0".to_string(),
    };
    let dataset = coco_dataset::convert_sequence(
        &[frame(0, vec![])],
        registry,
        &metadata,
        &mut AnnotationIdCounter::new(),
    );

    assert_eq!(dataset.info.version, "3.1.0");
    assert_eq!(dataset.info.simulation_id.as_deref(), Some("sim-42"));
    let value = serde_json::to_value(&dataset).unwrap();
    for key in ["info", "licenses", "images", "annotations", "categories"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
}

#[test]
fn test_yolo_convert_frame_scenario() {
    let registry = CategoryRegistry::builtin();
    let annotations = yolo_dataset::convert_frame(&frame(0, vec![scenario_object()]), registry);

    assert_eq!(annotations.len(), 1);
    assert_eq!(
        annotations[0].to_label_line(),
        "1 0.046875 0.072917 0.062500 0.104167"
    );
    assert_eq!(annotations[0].confidence, Some(0.9));
}

#[test]
fn test_yolo_excludes_culled_objects() {
    let registry = CategoryRegistry::builtin();
    let objects = vec![
        object("box", (0.0, 0.0, 10.0, 10.0), 0.0, true),
        object("box", (0.0, 0.0, 10.0, 10.0), 0.8, false),
    ];
    assert!(yolo_dataset::convert_frame(&frame(0, objects), registry).is_empty());
}

#[test]
fn test_yolo_normalized_values_stay_in_unit_range() {
    let registry = CategoryRegistry::builtin();
    let objects = vec![
        object("box", (0.0, 0.0, 640.0, 480.0), 1.0, true),
        object("torus", (600.0, 400.0, 640.0, 480.0), 0.4, true),
        object("cone", (0.0, 0.0, 1.0, 1.0), 0.4, true),
    ];
    let annotations = yolo_dataset::convert_frame(&frame(0, objects), registry);

    assert_eq!(annotations.len(), 3);
    for a in &annotations {
        for v in [a.x_center, a.y_center, a.width, a.height] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
    assert!(validate_yolo(&annotations, registry.len()).valid);
}

#[test]
fn test_yolo_sequence_artifacts() {
    let registry = CategoryRegistry::builtin();
    let frames = vec![frame(3, vec![scenario_object()]), frame(12, vec![])];
    let dataset = yolo_dataset::convert_sequence(&frames, registry, &ExportConfig::default());

    let names: Vec<&str> = dataset.label_files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["frame_000003.txt", "frame_000012.txt"]);
    assert_eq!(
        dataset.label_files[0].contents(),
        "1 0.046875 0.072917 0.062500 0.104167\n"
    );
    assert_eq!(dataset.label_files[1].contents(), "");
    assert_eq!(dataset.annotation_count(), 1);

    let classes: Vec<&str> = dataset.classes_txt.lines().collect();
    let expected: Vec<&str> = BUILTIN_CATEGORIES.iter().map(|(name, _)| *name).collect();
    assert_eq!(classes, expected);

    assert!(dataset.data_yaml.contains("train: images/train"));
    assert!(dataset.data_yaml.contains("val: images/val"));
    assert!(dataset.data_yaml.contains("nc: 10"));
    assert!(dataset.data_yaml.contains("names: ['box', 'sphere', 'cylinder'"));
}

#[test]
fn test_validate_coco_dangling_category_is_error() {
    let document = json!({
        "info": {},
        "licenses": [],
        "images": [{"id": 0, "file_name": "frame_000000.png", "width": 640, "height": 480}],
        "annotations": [{
            "id": 0, "image_id": 0, "category_id": 99,
            "bbox": [10.0, 10.0, 40.0, 50.0], "area": 2000.0, "segmentation": [], "iscrowd": 0
        }],
        "categories": [{"id": 0, "name": "box", "supercategory": "primitive"}]
    });
    let report = validate_coco_value(&document);

    assert!(!report.valid);
    assert!(report.errors.iter().any(|e| e.contains("unknown category_id 99")));
    assert!(report.warnings.iter().all(|w| !w.contains("category_id")));
}

#[test]
fn test_validate_coco_structural_errors() {
    let document = json!({
        "info": {},
        "images": [
            {"id": 0, "file_name": "a.png", "width": 640, "height": 480},
            {"id": 0, "file_name": "", "width": 0, "height": 480}
        ],
        "annotations": [
            {"id": 1, "image_id": 5, "category_id": 0, "bbox": [0, 0, 1], "area": 1.0},
            {"id": 1, "image_id": 0, "category_id": 0, "bbox": [0, 0, -1, 2], "area": -2.0},
            {"id": 2, "image_id": 0, "category_id": 0, "bbox": [0, 0, "w", 2], "area": 1.0}
        ],
        "categories": [{"id": 0, "name": "box", "supercategory": "primitive"}]
    });
    let report = validate_coco_value(&document);
    let has = |needle: &str| report.errors.iter().any(|e| e.contains(needle));

    assert!(!report.valid);
    assert!(has("Missing required top-level key: licenses"));
    assert!(has("Duplicate image id: 0"));
    assert!(has("invalid width"));
    assert!(has("empty or missing file_name"));
    assert!(has("Duplicate annotation id: 1"));
    assert!(has("unknown image_id 5"));
    assert!(has("exactly 4 elements"));
    assert!(has("negative size"));
    assert!(has("negative area"));
    assert!(has("non-numeric"));
}

#[test]
fn test_validate_coco_warnings_do_not_fail() {
    let document = json!({
        "info": {},
        "licenses": [],
        "images": [{"id": 0, "file_name": "a.png", "width": 640, "height": 480}],
        "annotations": [
            {"id": 0, "image_id": 0, "category_id": 0, "bbox": [1, 1, 0, 5], "area": 0.0, "segmentation": []},
            {"id": 1, "image_id": 0, "category_id": 1, "bbox": [1, 1, 2, 5], "area": 10.0, "segmentation": []}
        ],
        "categories": [
            {"id": 0, "name": "box", "supercategory": "primitive"},
            {"id": 1, "name": "box", "supercategory": "primitive"}
        ]
    });
    let report = validate_coco_value(&document);

    assert!(report.valid, "{:?}", report.errors);
    assert!(report.warnings.iter().any(|w| w.contains("zero area")));
    assert!(report.warnings.iter().any(|w| w.contains("Duplicate category name: box")));
    let segmentation_warnings = report
        .warnings
        .iter()
        .filter(|w| w.contains("segmentation"))
        .count();
    assert_eq!(segmentation_warnings, 1);
}

#[test]
fn test_validate_yolo_ranges() {
    let good = YoloAnnotation {
        class_id: 2,
        x_center: 0.5,
        y_center: 0.5,
        width: 0.2,
        height: 0.2,
        confidence: Some(0.7),
    };
    assert!(validate_yolo(&[good], 10).valid);

    let bad_class = YoloAnnotation { class_id: 10, ..good };
    let out_of_range = YoloAnnotation { x_center: 1.2, ..good };
    let not_finite = YoloAnnotation { height: f64::NAN, ..good };
    let report = validate_yolo(&[bad_class, out_of_range, not_finite], 10);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 3);

    let zero_width = YoloAnnotation { width: 0.0, ..good };
    let odd_confidence = YoloAnnotation { confidence: Some(1.5), ..good };
    let no_confidence = YoloAnnotation { confidence: None, ..good };
    let report = validate_yolo(&[zero_width, odd_confidence, no_confidence], 10);
    assert!(report.valid);
    assert_eq!(report.warnings.len(), 3);
}

#[test]
fn test_validate_yolo_missing_confidence_warns_once() {
    let annotation = YoloAnnotation {
        class_id: 0,
        x_center: 0.5,
        y_center: 0.5,
        width: 0.2,
        height: 0.2,
        confidence: None,
    };
    let report = validate_yolo(&[annotation, annotation, annotation], 10);

    assert!(report.valid);
    assert_eq!(report.errors.len(), 0);
    assert_eq!(
        report.warnings,
        vec!["3 annotations have no confidence value".to_string()]
    );

    let with_confidence = YoloAnnotation {
        confidence: Some(0.4),
        ..annotation
    };
    assert!(validate_yolo(&[with_confidence], 10).warnings.is_empty());
}

#[test]
fn test_validate_yolo_label_text() {
    let report = validate_yolo_label_text("1 0.046875 0.072917 0.062500 0.104167\n\n", 10);
    assert!(report.valid);

    let report = validate_yolo_label_text("1.5 0.5 0.5 0.1 0.1\n0 0.5 abc 0.1 0.1\n0 0.5 0.5\n", 10);
    assert!(!report.valid);
    assert!(report.errors[0].contains("not a non-negative integer"));
    assert!(report.errors[1].contains("not numeric"));
    assert!(report.errors[2].contains("must have 5 fields"));
}

#[test]
fn test_particles_to_csv() {
    let particles = vec![
        Particle {
            id: ParticleKey::Number(1),
            group_id: ParticleKey::Text("g1".to_string()),
            shape: "box".to_string(),
            mass: 2.5,
            position: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(0.1, 0.0, -0.1),
            rotation: Vec3::ZERO,
            angular_velocity: None,
        },
        Particle {
            id: ParticleKey::Number(2),
            group_id: ParticleKey::Number(7),
            shape: "sphere".to_string(),
            mass: 1.0,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            angular_velocity: Some(Vec3::new(0.0, 1.25, 0.0)),
        },
    ];
    let csv = particles_to_csv(&particles);
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(
        lines[1],
        "1,g1,box,2.500000,1.000000,2.000000,3.000000,0.100000,0.000000,-0.100000,0.000000,0.000000,0.000000,0,0,0"
    );
    assert!(lines[2].ends_with(",0.000000,1.250000,0.000000"));
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_frame_deserializes_with_optional_fields() {
    let raw = json!({
        "frameNumber": 4,
        "timestamp": 12.5,
        "camera": {
            "intrinsics": {"resolution": {"width": 640, "height": 480}, "fx": 500.0},
            "extrinsics": {"position": [0, 0, 0]}
        },
        "objects": [{
            "class": "cube",
            "pose": {"position": {"x": 0, "y": 0, "z": 0}},
            "velocity": {"x": 0, "y": 0, "z": 0},
            "boundingBox2D": {"xMin": 1, "xMax": 2, "yMin": 3, "yMax": 4, "confidence": 1},
            "inFrustum": true,
            "distanceFromCamera": 3.0,
            "occlusionLevel": 0.0
        }]
    });
    let frame: GroundTruthFrame = serde_json::from_value(raw).unwrap();

    assert_eq!(frame.version, 1);
    assert_eq!(frame.camera.intrinsics.extra.get("fx"), Some(&json!(500.0)));
    assert!(frame.objects[0].angular_velocity.is_none());
    assert_eq!(frame.objects[0].angular_velocity_or_zero(), Vec3::ZERO);

    let registry = CategoryRegistry::builtin();
    let (image, annotations) =
        coco_dataset::convert_frame(&frame, 0, registry, &mut AnnotationIdCounter::new());
    assert_eq!(image.camera_intrinsics, Some(json!({"fx": 500.0})));
    assert_eq!(annotations[0].category_id, FALLBACK_CATEGORY_ID);
}
