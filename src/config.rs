use clap::{Parser, ValueEnum};

use crate::types::SessionMetadata;

/// Command-line arguments for exporting a ground-truth recording.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Recording to export: a JSON recording, a JSON array of frames,
    /// a JSON Lines file, or a directory of per-frame JSON files
    #[arg(short = 'i', long = "input")]
    pub input: String,

    /// Directory the exported artifacts are written to
    #[arg(short = 'o', long = "output_dir", default_value = "dataset_export")]
    pub output_dir: String,

    /// Which dataset format(s) to export
    #[arg(long = "format", value_enum, default_value = "all")]
    pub format: ExportFormat,

    /// How annotation ids behave across consecutive COCO exports
    #[arg(long = "id_policy", value_enum, default_value = "accumulate")]
    pub id_policy: AnnotationIdPolicy,

    /// Optional JSON file with raw particle state for the legacy CSV export
    #[arg(long = "particles")]
    pub particles: Option<String>,

    /// Value of the `path` entry in data.yaml
    #[arg(long = "dataset_root", default_value = ".")]
    pub dataset_root: String,

    /// Only run validation, do not write any artifact
    #[arg(long = "validate_only")]
    pub validate_only: bool,

    /// Override the simulation id found in the recording
    #[arg(long = "simulation_id")]
    pub simulation_id: Option<String>,

    /// Override the engine version found in the recording
    #[arg(long = "engine_version")]
    pub engine_version: Option<String>,
}

impl Args {
    pub fn to_export_config(&self) -> ExportConfig {
        ExportConfig {
            id_policy: self.id_policy,
            dataset_root: self.dataset_root.clone(),
            ..ExportConfig::default()
        }
    }

    /// Apply the command-line overrides on top of the recording's metadata.
    pub fn apply_metadata_overrides(&self, metadata: &mut SessionMetadata) {
        if let Some(simulation_id) = &self.simulation_id {
            metadata.simulation_id = simulation_id.clone();
        }
        if let Some(engine_version) = &self.engine_version {
            metadata.engine_version = engine_version.clone();
        }
    }
}

// Dataset formats the binary can emit
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum ExportFormat {
    Coco,
    Yolo,
    All,
}

impl ExportFormat {
    pub fn includes_coco(self) -> bool {
        matches!(self, ExportFormat::Coco | ExportFormat::All)
    }

    pub fn includes_yolo(self) -> bool {
        matches!(self, ExportFormat::Yolo | ExportFormat::All)
    }
}

/// Annotation id behaviour between two COCO exports of the same session.
///
/// `Accumulate` keeps one ever-growing id space until the session is
/// cleared. `ResetPerExport` starts every export from id 0.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug, Default)]
pub enum AnnotationIdPolicy {
    #[default]
    Accumulate,
    ResetPerExport,
}

/// Settings that shape the exported artifacts.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub id_policy: AnnotationIdPolicy,
    pub dataset_root: String,
    pub train_dir: String,
    pub val_dir: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            id_policy: AnnotationIdPolicy::Accumulate,
            dataset_root: ".".to_string(),
            train_dir: "images/train".to_string(),
            val_dir: "images/val".to_string(),
        }
    }
}
