//! Recording session: the frame buffer, the annotation id counter and the
//! category registry they are exported against.

use log::{debug, info};

use crate::categories::CategoryRegistry;
use crate::config::ExportConfig;
use crate::types::{GroundTruthFrame, SessionMetadata};

/// Append-only, in-memory list of captured frames.
#[derive(Debug, Default, Clone)]
pub struct FrameBuffer {
    frames: Vec<GroundTruthFrame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Store a frame as-is. Nothing is validated here.
    pub fn append(&mut self, frame: GroundTruthFrame) {
        self.frames.push(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The first `len` frames, in capture order.
    pub fn snapshot(&self, len: usize) -> &[GroundTruthFrame] {
        &self.frames[..len.min(self.frames.len())]
    }

    pub fn frames(&self) -> &[GroundTruthFrame] {
        &self.frames
    }
}

/// Monotonic source of COCO annotation ids.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationIdCounter {
    next: u64,
}

impl AnnotationIdCounter {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Recording,
    Stopped,
}

/// One recording session. Owns its buffer and id counter; the registry is shared
/// and immutable.
#[derive(Debug, Clone)]
pub struct Session<'r> {
    pub(crate) buffer: FrameBuffer,
    pub(crate) annotation_ids: AnnotationIdCounter,
    pub(crate) registry: &'r CategoryRegistry,
    pub(crate) config: ExportConfig,
    pub(crate) metadata: SessionMetadata,
    state: SessionState,
}

impl Session<'static> {
    /// A session exporting against the built-in category registry.
    pub fn new(metadata: SessionMetadata, config: ExportConfig) -> Self {
        Session::with_registry(CategoryRegistry::builtin(), metadata, config)
    }
}

impl<'r> Session<'r> {
    pub fn with_registry(
        registry: &'r CategoryRegistry,
        metadata: SessionMetadata,
        config: ExportConfig,
    ) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            annotation_ids: AnnotationIdCounter::new(),
            registry,
            config,
            metadata,
            state: SessionState::Empty,
        }
    }

    pub fn start_recording(&mut self) {
        if self.state != SessionState::Recording {
            info!("Recording started ({} frames buffered)", self.buffer.len());
        }
        self.state = SessionState::Recording;
    }

    /// Halts future appends from the capture loop. Exports are unaffected.
    pub fn stop_recording(&mut self) {
        self.state = if self.buffer.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Stopped
        };
        info!("Recording stopped with {} frames", self.buffer.len());
    }

    /// Store a frame. A single-shot capture on an empty session starts recording.
    pub fn append(&mut self, frame: GroundTruthFrame) {
        debug!(
            "Buffered frame {} ({} objects)",
            frame.frame_number,
            frame.objects.len()
        );
        self.buffer.append(frame);
        if self.state == SessionState::Empty {
            self.state = SessionState::Recording;
        }
    }

    /// Empty the buffer and reset the annotation id counter.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.annotation_ids.reset();
        self.state = SessionState::Empty;
        info!("Frame buffer cleared");
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn registry(&self) -> &'r CategoryRegistry {
        self.registry
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// Id the next committed COCO annotation would receive.
    pub fn next_annotation_id(&self) -> u64 {
        self.annotation_ids.peek()
    }
}
