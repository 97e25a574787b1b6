//! Export orchestration
//!
//! Buffer snapshot -> conversion -> validation -> in-memory artifacts. An
//! export that fails validation produces nothing at all.

use std::collections::HashSet;
use std::fmt;

use log::{error, info, warn};

use crate::coco_dataset;
use crate::config::AnnotationIdPolicy;
use crate::error::{DatasetFormat, ExportError, EMPTY_BUFFER_MESSAGE};
use crate::particle_csv::particles_to_csv;
use crate::session::{AnnotationIdCounter, Session};
use crate::types::Particle;
use crate::validation::{validate_coco, validate_yolo, ValidationReport};
use crate::yolo_dataset;

pub const COCO_FILE_NAME: &str = "coco_annotations.json";
pub const YOLO_LABELS_DIR: &str = "labels";
pub const CLASSES_FILE_NAME: &str = "classes.txt";
pub const DATA_YAML_FILE_NAME: &str = "data.yaml";
pub const PARTICLES_CSV_FILE_NAME: &str = "particles.csv";

/// One output file, still in memory. `path` is relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// What a successful export produced.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub format: DatasetFormat,
    pub frames: usize,
    pub annotations: usize,
    pub warnings: Vec<String>,
    pub artifacts: Vec<Artifact>,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} export: {} frames, {} annotations, {} warnings",
            self.format,
            self.frames,
            self.annotations,
            self.warnings.len()
        )
    }
}

/// Combined result of [`Session::validate_current_buffer`].
#[derive(Debug, Clone)]
pub struct BufferValidation {
    pub frame_count: usize,
    pub coco: ValidationReport,
    pub yolo: ValidationReport,
}

impl BufferValidation {
    pub fn is_valid(&self) -> bool {
        self.coco.valid && self.yolo.valid
    }

    pub fn error_count(&self) -> usize {
        self.coco.errors.len() + self.yolo.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.coco.warnings.len() + self.yolo.warnings.len()
    }
}

impl fmt::Display for BufferValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames: {}", self.frame_count)?;
        writeln!(f, "COCO: {}", self.coco)?;
        writeln!(f, "YOLO: {}", self.yolo)?;
        write!(
            f,
            "Total: {} errors, {} warnings",
            self.error_count(),
            self.warning_count()
        )
    }
}

impl<'r> Session<'r> {
    /// Dry-run both converters and validators over the current buffer.
    ///
    /// COCO is checked over every frame, YOLO over the first frame only.
    /// Nothing is committed: the annotation id counter does not move.
    pub fn validate_current_buffer(&self) -> BufferValidation {
        let len = self.buffer.len();
        if len == 0 {
            return BufferValidation {
                frame_count: 0,
                coco: ValidationReport::failed(EMPTY_BUFFER_MESSAGE),
                yolo: ValidationReport::failed(EMPTY_BUFFER_MESSAGE),
            };
        }
        let frames = self.buffer.snapshot(len);

        let mut ids = self.export_id_counter();
        let dataset = coco_dataset::convert_sequence(frames, self.registry, &self.metadata, &mut ids);
        let coco = validate_coco(&dataset);

        let sample = yolo_dataset::convert_frame(&frames[0], self.registry);
        let yolo = validate_yolo(&sample, self.registry.len());

        let validation = BufferValidation {
            frame_count: len,
            coco,
            yolo,
        };
        info!(
            "Validated {} frames: COCO {}, YOLO {}",
            len, validation.coco, validation.yolo
        );
        validation
    }

    /// Convert, validate and serialize the buffer as one COCO document.
    ///
    /// The session id counter only advances when the export succeeds.
    pub fn export_coco(&mut self) -> Result<ExportSummary, ExportError> {
        let len = self.buffer.len();
        if len == 0 {
            error!("COCO export aborted: {}", EMPTY_BUFFER_MESSAGE);
            return Err(ExportError::EmptyBuffer);
        }
        let frames = self.buffer.snapshot(len);

        let mut ids = self.export_id_counter();
        let dataset = coco_dataset::convert_sequence(frames, self.registry, &self.metadata, &mut ids);

        let report = validate_coco(&dataset);
        let warnings = check_report(DatasetFormat::Coco, report)?;

        let bytes = serde_json::to_vec_pretty(&dataset).map_err(|source| {
            ExportError::Serialization {
                format: DatasetFormat::Coco,
                source,
            }
        })?;

        self.annotation_ids = ids;

        let summary = ExportSummary {
            format: DatasetFormat::Coco,
            frames: len,
            annotations: dataset.annotations.len(),
            warnings,
            artifacts: vec![Artifact::new(COCO_FILE_NAME, bytes)],
        };
        info!("{}", summary);
        Ok(summary)
    }

    /// Convert and validate every frame as YOLO labels plus manifests.
    pub fn export_yolo(&self) -> Result<ExportSummary, ExportError> {
        let len = self.buffer.len();
        if len == 0 {
            error!("YOLO export aborted: {}", EMPTY_BUFFER_MESSAGE);
            return Err(ExportError::EmptyBuffer);
        }
        let frames = self.buffer.snapshot(len);

        let dataset = yolo_dataset::convert_sequence(frames, self.registry, &self.config);

        let mut report = ValidationReport {
            valid: true,
            ..ValidationReport::default()
        };
        let mut seen_files = HashSet::new();
        for label_file in &dataset.label_files {
            if !seen_files.insert(label_file.file_name.as_str()) {
                report.errors.push(format!(
                    "{}: duplicate label file (frame number {} appears more than once)",
                    label_file.file_name, label_file.frame_number
                ));
            }
            let file_report = validate_yolo(&label_file.annotations, self.registry.len());
            let prefix = &label_file.file_name;
            report
                .errors
                .extend(file_report.errors.into_iter().map(|e| format!("{}: {}", prefix, e)));
            report
                .warnings
                .extend(file_report.warnings.into_iter().map(|w| format!("{}: {}", prefix, w)));
        }
        report.valid = report.errors.is_empty();
        let warnings = check_report(DatasetFormat::Yolo, report)?;

        let mut artifacts = Vec::with_capacity(dataset.label_files.len() + 2);
        for label_file in &dataset.label_files {
            artifacts.push(Artifact::new(
                format!("{}/{}", YOLO_LABELS_DIR, label_file.file_name),
                label_file.contents(),
            ));
        }
        artifacts.push(Artifact::new(CLASSES_FILE_NAME, dataset.classes_txt.as_str()));
        artifacts.push(Artifact::new(DATA_YAML_FILE_NAME, dataset.data_yaml.as_str()));

        let summary = ExportSummary {
            format: DatasetFormat::Yolo,
            frames: len,
            annotations: dataset.annotation_count(),
            warnings,
            artifacts,
        };
        info!("{}", summary);
        Ok(summary)
    }

    fn export_id_counter(&self) -> AnnotationIdCounter {
        match self.config.id_policy {
            AnnotationIdPolicy::Accumulate => self.annotation_ids,
            AnnotationIdPolicy::ResetPerExport => AnnotationIdCounter::new(),
        }
    }
}

/// Legacy CSV dump of raw particle state. Not schema-gated.
pub fn export_particles_csv(particles: &[Particle]) -> Artifact {
    info!("Exporting {} particles to CSV", particles.len());
    Artifact::new(PARTICLES_CSV_FILE_NAME, particles_to_csv(particles))
}

// Log the report and turn a failed one into a schema error
fn check_report(format: DatasetFormat, report: ValidationReport) -> Result<Vec<String>, ExportError> {
    for warning in &report.warnings {
        warn!("{}: {}", format, warning);
    }
    if report.valid {
        return Ok(report.warnings);
    }
    error!(
        "{} export aborted: {} errors, {} warnings",
        format,
        report.errors.len(),
        report.warnings.len()
    );
    for e in &report.errors {
        error!("{}: {}", format, e);
    }
    Err(ExportError::Schema {
        format,
        errors: report.errors,
        warnings: report.warnings,
    })
}
