//! # Video Input Module
//!
//! Frame sources feeding the extraction pipeline: an ffmpeg-backed decoder
//! for video files, a still-image sequence reader and an in-memory source.

pub mod types;
pub mod source;

mod ffmpeg;
mod sequence;

pub use types::{Frame, VideoMetadata};
pub use source::{FrameSource, MemorySource};
pub use ffmpeg::FfmpegSource;
pub use sequence::ImageSequenceSource;
