use glob::glob;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ExportError;
use crate::export::Artifact;
use crate::types::{GroundTruthFrame, Particle, Recording};
use crate::utils::{
    create_output_directory, create_progress_bar, read_and_parse_json, recreate_output_directory,
};

/// Output boundary: receives finished artifacts and persists them somewhere.
pub trait Materializer {
    fn materialize(&mut self, artifact: &Artifact) -> std::io::Result<()>;
}

/// Keeps artifacts in memory.
impl Materializer for Vec<Artifact> {
    fn materialize(&mut self, artifact: &Artifact) -> std::io::Result<()> {
        self.push(artifact.clone());
        Ok(())
    }
}

/// Writes artifacts below a root directory, creating parents as needed.
pub struct DirectoryWriter {
    root: PathBuf,
    show_progress: bool,
}

impl DirectoryWriter {
    /// Write into `root`, keeping whatever it already contains.
    ///
    /// Artifacts with the same path are overwritten; any other file stays,
    /// including label files of frames that are not part of this export.
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = create_output_directory(&root.into())?;
        Ok(Self {
            root,
            show_progress: false,
        })
    }

    /// Write into a freshly emptied `root`. Everything previously in it is deleted.
    pub fn recreate(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = recreate_output_directory(&root.into())?;
        Ok(Self {
            root,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a batch of artifacts, with a progress bar when enabled.
    pub fn write_all(&mut self, artifacts: &[Artifact], label: &str) -> std::io::Result<()> {
        let pb = self
            .show_progress
            .then(|| create_progress_bar(artifacts.len() as u64, label));
        for artifact in artifacts {
            self.materialize(artifact)?;
            if let Some(pb) = &pb {
                pb.inc(1);
            }
        }
        if let Some(pb) = pb {
            pb.finish_with_message(format!("{} written", label));
        }
        Ok(())
    }
}

impl Materializer for DirectoryWriter {
    fn materialize(&mut self, artifact: &Artifact) -> std::io::Result<()> {
        let path = self.root.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writer.write_all(&artifact.bytes)?;
        writer.flush()
    }
}

/// Load a recording from a JSON recording document, a JSON array of frames,
/// a JSON Lines file, or a directory of per-frame JSON files.
pub fn load_recording(path: &Path) -> Result<Recording, ExportError> {
    if path.is_dir() {
        return load_frame_directory(path);
    }

    if path.extension().is_some_and(|ext| ext == "jsonl") {
        let frames = read_json_lines(path)?;
        info!("Read {} frames from {}", frames.len(), path.display());
        return Ok(Recording {
            frames,
            ..Recording::default()
        });
    }

    let document: Value = read_and_parse_json(path)?;
    let recording = if document.is_array() {
        Recording {
            frames: from_value(document, path)?,
            ..Recording::default()
        }
    } else {
        from_value(document, path)?
    };
    info!("Read {} frames from {}", recording.frames.len(), path.display());
    Ok(recording)
}

fn from_value<T: serde::de::DeserializeOwned>(value: Value, path: &Path) -> Result<T, ExportError> {
    serde_json::from_value(value).map_err(|source| ExportError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn read_json_lines(path: &Path) -> Result<Vec<GroundTruthFrame>, ExportError> {
    let reader = BufReader::new(File::open(path)?);
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame = serde_json::from_str(&line).map_err(|source| ExportError::Parse {
            path: format!("{}:{}", path.display(), index + 1),
            source,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

// Per-frame files, ordered by frame number
fn load_frame_directory(dirname: &Path) -> Result<Recording, ExportError> {
    let pattern = format!("{}/*.json", dirname.display());
    let entries = glob(&pattern).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let mut frames: Vec<GroundTruthFrame> = Vec::new();
    for entry in entries {
        let json_path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        frames.push(read_and_parse_json(&json_path)?);
    }
    frames.sort_by_key(|frame| frame.frame_number);

    info!("Read {} frames from {}", frames.len(), dirname.display());
    Ok(Recording {
        frames,
        ..Recording::default()
    })
}

/// Load the raw particle list used by the legacy CSV export.
pub fn load_particles(path: &Path) -> Result<Vec<Particle>, ExportError> {
    read_and_parse_json(path)
}
