use crate::foundation::error::{HaloError, HaloResult};
use crate::stage::frame::Frame;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Consumer of finished frames (hardware transmitter, preview broadcaster).
///
/// Called once per tick; implementations must not block for longer than a tick.
pub trait FrameSink: Send {
    /// Hand off one frame of the stage byte length.
    fn send_frame(&mut self, frame: &Frame) -> HaloResult<()>;
}

/// Discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn send_frame(&mut self, _frame: &Frame) -> HaloResult<()> {
        Ok(())
    }
}

/// In-memory sink for tests and debugging.
///
/// Clones share the same buffer, so a test can keep one handle while the engine owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct InMemorySink {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the captured frames in arrival order.
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().clone()
    }

    /// Most recent frame.
    pub fn last(&self) -> Option<Frame> {
        self.lock().last().cloned()
    }

    /// Number of captured frames.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` before the first frame arrives.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl FrameSink for InMemorySink {
    fn send_frame(&mut self, frame: &Frame) -> HaloResult<()> {
        self.lock().push(frame.clone());
        Ok(())
    }
}

/// Appends raw frame bytes to a file, one frame after another.
#[derive(Debug)]
pub struct RawFileSink {
    path: PathBuf,
    out: BufWriter<File>,
    frames_written: u64,
}

impl RawFileSink {
    /// Create (truncate) the output file.
    pub fn create(path: impl AsRef<Path>) -> HaloResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                HaloError::io(format!("create output dir '{}': {e}", parent.display()))
            })?;
        }
        let file = File::create(&path)
            .map_err(|e| HaloError::io(format!("create '{}': {e}", path.display())))?;
        Ok(Self {
            path,
            out: BufWriter::new(file),
            frames_written: 0,
        })
    }

    /// Frames appended so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush buffered bytes to disk.
    pub fn finish(&mut self) -> HaloResult<()> {
        self.out
            .flush()
            .map_err(|e| HaloError::io(format!("flush '{}': {e}", self.path.display())))
    }
}

impl FrameSink for RawFileSink {
    fn send_frame(&mut self, frame: &Frame) -> HaloResult<()> {
        self.out
            .write_all(frame.as_bytes())
            .map_err(|e| HaloError::io(format!("write '{}': {e}", self.path.display())))?;
        self.frames_written += 1;
        Ok(())
    }
}

/// The three output streams fed every tick.
pub struct Outputs {
    /// Physical stage; receives the blended live frame.
    pub hardware: Box<dyn FrameSink>,
    /// Live preview; same frame as `hardware`.
    pub live_preview: Box<dyn FrameSink>,
    /// Ready preview; the unblended ready frame.
    pub ready_preview: Box<dyn FrameSink>,
}

impl Default for Outputs {
    fn default() -> Self {
        Self {
            hardware: Box::new(NullSink),
            live_preview: Box::new(NullSink),
            ready_preview: Box::new(NullSink),
        }
    }
}

impl std::fmt::Debug for Outputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outputs").finish_non_exhaustive()
    }
}

impl Outputs {
    /// Hand both frames to their sinks. Failures are logged and otherwise ignored.
    pub fn publish(&mut self, live: &Frame, ready: &Frame) {
        let sends = [
            ("hardware", self.hardware.send_frame(live)),
            ("live_preview", self.live_preview.send_frame(live)),
            ("ready_preview", self.ready_preview.send_frame(ready)),
        ];
        for (name, result) in sends {
            if let Err(err) = result {
                tracing::warn!(sink = name, error = %err, "frame sink failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/sink.rs"]
mod tests;
