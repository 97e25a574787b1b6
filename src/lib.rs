//! Simulation ground truth to training dataset exporter
//!
//! This library buffers ground-truth frames for a recording session and converts
//! them into COCO and YOLO datasets. Every export is validated against the
//! target schema first; nothing is produced when validation fails.

pub mod categories;
pub mod coco;
pub mod coco_dataset;
pub mod config;
pub mod conversion;
pub mod error;
pub mod export;
pub mod io;
pub mod particle_csv;
pub mod session;
pub mod types;
pub mod utils;
pub mod validation;
pub mod yolo_dataset;

// Re-export commonly used types and functions
pub use categories::{CategoryRegistry, FALLBACK_CATEGORY_ID};
pub use config::{AnnotationIdPolicy, Args, ExportConfig, ExportFormat};
pub use error::{DatasetFormat, ExportError};
pub use export::{export_particles_csv, Artifact, BufferValidation, ExportSummary};
pub use io::{load_recording, DirectoryWriter, Materializer};
pub use session::{FrameBuffer, Session, SessionState};
pub use types::{GroundTruthFrame, Particle, SceneObject, SessionMetadata};
pub use validation::{validate_coco, validate_coco_value, validate_yolo, ValidationReport};

// COCO-specific exports
pub use coco::CocoDataset;
