use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::ProfilmResult;
use crate::render::frame::Frame;

/// Configuration handed to a [`FrameSink`] at the start of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output geometry.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing
/// `FrameIndex` order within the requested render range. Frames are never
/// skipped or duplicated by the caller.
pub trait FrameSink: Send {
    /// Prepare the sink for a run at the given geometry and rate.
    fn begin(&mut self, cfg: SinkConfig) -> ProfilmResult<()>;
    /// Consume one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ProfilmResult<()>;
    /// Finalize the run.
    fn end(&mut self) -> ProfilmResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Frames in timeline order.
    pub frames: Vec<(FrameIndex, Frame)>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration received by the last `begin` call, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ProfilmResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ProfilmResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ProfilmResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_records_frames_in_push_order() {
        let canvas = Canvas { width: 8, height: 8 };
        let mut sink = InMemorySink::new();
        sink.begin(SinkConfig { canvas, fps: Fps { num: 30, den: 1 } }).unwrap();
        sink.push_frame(FrameIndex(0), &Frame::new(canvas)).unwrap();
        sink.push_frame(FrameIndex(1), &Frame::new(canvas)).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.frames.len(), 2);
        assert_eq!(sink.frames[0].0, FrameIndex(0));
        assert_eq!(sink.frames[1].0, FrameIndex(1));
        assert_eq!(sink.config().map(|c| c.canvas), Some(canvas));
    }

    #[test]
    fn begin_resets_previously_collected_frames() {
        let canvas = Canvas { width: 4, height: 4 };
        let cfg = SinkConfig { canvas, fps: Fps { num: 24, den: 1 } };
        let mut sink = InMemorySink::new();
        sink.begin(cfg).unwrap();
        sink.push_frame(FrameIndex(0), &Frame::new(canvas)).unwrap();
        sink.begin(cfg).unwrap();
        assert!(sink.frames.is_empty());
    }
}
