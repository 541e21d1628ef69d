use crate::error::{Result, VideoError};
use crate::video::types::{Frame, VideoMetadata};

/// Sequential, seekable supply of decoded frames
///
/// Reads are blocking. `read_next` returns `Ok(None)` at end of stream,
/// which is a normal terminal condition rather than an error.
pub trait FrameSource {
    fn is_open(&self) -> bool;

    /// Frame rate reported by the container
    fn frame_rate(&self) -> f64;

    fn total_frame_count(&self) -> u64;

    /// Position the source so the next read returns `frame_index`
    fn seek(&mut self, frame_index: u64) -> Result<()>;

    fn read_next(&mut self) -> Result<Option<Frame>>;

    fn metadata(&self) -> VideoMetadata;
}

/// Frames held in memory
pub struct MemorySource {
    frames: Vec<Frame>,
    fps: f64,
    position: usize,
}

impl MemorySource {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        Self { frames, fps, position: 0 }
    }
}

impl FrameSource for MemorySource {
    fn is_open(&self) -> bool {
        true
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn total_frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    fn seek(&mut self, frame_index: u64) -> Result<()> {
        if frame_index > self.frames.len() as u64 {
            return Err(VideoError::SeekFailed {
                frame: frame_index,
                reason: format!("source holds {} frames", self.frames.len()),
            }
            .into());
        }
        self.position = frame_index as usize;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Frame>> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }

    fn metadata(&self) -> VideoMetadata {
        let (width, height) = self
            .frames
            .first()
            .map(|frame| (frame.width(), frame.height()))
            .unwrap_or((0, 0));

        VideoMetadata {
            fps: self.fps,
            width,
            height,
            frame_count: self.frames.len() as u64,
        }
    }
}
