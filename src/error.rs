use std::fmt;

use thiserror::Error;

pub const EMPTY_BUFFER_MESSAGE: &str = "No frames in buffer";

/// Dataset format an export or validation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Coco,
    Yolo,
}

impl fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DatasetFormat::Coco => "COCO",
            DatasetFormat::Yolo => "YOLO",
        })
    }
}

/// Everything that can stop an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Export attempted while the session holds no frames.
    #[error("No frames in buffer")]
    EmptyBuffer,

    /// The converted dataset failed schema validation; nothing was produced.
    #[error("{format} export failed validation: {} errors, {} warnings: {}", .errors.len(), .warnings.len(), .errors.join("; "))]
    Schema {
        format: DatasetFormat,
        errors: Vec<String>,
        warnings: Vec<String>,
    },

    #[error("failed to serialize {format} payload: {source}")]
    Serialization {
        format: DatasetFormat,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
