use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, VideoError};
use crate::video::source::FrameSource;
use crate::video::types::{Frame, VideoMetadata};

/// Directory of still images played back as consecutive frames
///
/// Files are ordered by name, so zero-padded names (`frame_000123.png`)
/// keep their numeric order.
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    fps: f64,
    width: u32,
    height: u32,
    position: usize,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(directory: P, fps: f64) -> Result<Self> {
        let directory = directory.as_ref();
        let open_failed = |reason: &str| VideoError::OpenFailed {
            path: directory.display().to_string(),
            reason: reason.to_string(),
        };

        let mut files = Vec::new();
        let entries = std::fs::read_dir(directory).map_err(|e| open_failed(&e.to_string()))?;
        for entry in entries {
            let path = entry.map_err(|e| open_failed(&e.to_string()))?.path();
            if path.is_file() && !is_hidden_file(&path) && is_image_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let first = files.first().ok_or_else(|| open_failed("no image files found"))?;
        let (width, height) = image::image_dimensions(first)
            .map_err(|e| open_failed(&e.to_string()))?;

        info!(
            "Opened image sequence {}: {} frames of {}x{} @ {:.3} fps",
            directory.display(),
            files.len(),
            width,
            height,
            fps
        );

        Ok(Self { files, fps, width, height, position: 0 })
    }

    /// Whether a path looks like a directory of frames rather than a video file
    pub fn is_sequence<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }
}

impl FrameSource for ImageSequenceSource {
    fn is_open(&self) -> bool {
        !self.files.is_empty()
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn total_frame_count(&self) -> u64 {
        self.files.len() as u64
    }

    fn seek(&mut self, frame_index: u64) -> Result<()> {
        if frame_index > self.files.len() as u64 {
            return Err(VideoError::SeekFailed {
                frame: frame_index,
                reason: format!("sequence holds {} frames", self.files.len()),
            }
            .into());
        }
        self.position = frame_index as usize;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.position) else {
            return Ok(None);
        };

        let image = image::open(path).map_err(|e| VideoError::DecodingFailed {
            reason: format!("{}: {}", path.display(), e),
        })?;
        self.position += 1;

        Ok(Some(Frame::new(image.to_rgb8())))
    }

    fn metadata(&self) -> VideoMetadata {
        VideoMetadata {
            fps: self.fps,
            width: self.width,
            height: self.height,
            frame_count: self.files.len() as u64,
        }
    }
}

fn is_image_file(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "bmp"
        ),
        None => false,
    }
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sequence_reads_in_name_order() {
        let dir = tempdir().unwrap();
        for i in [2u8, 0, 1] {
            Frame::new_filled(8, 6, [i * 10, 0, 0])
                .save_png(dir.path().join(format!("frame_{:04}.png", i)))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), 30.0).unwrap();
        assert_eq!(source.total_frame_count(), 3);
        assert_eq!(source.metadata().width, 8);

        source.seek(1).unwrap();
        let frame = source.read_next().unwrap().unwrap();
        assert_eq!(frame.as_image().get_pixel(0, 0).0, [10, 0, 0]);
        assert!(source.read_next().unwrap().is_some());
        assert!(source.read_next().unwrap().is_none());
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempdir().unwrap();
        let err = ImageSequenceSource::open(dir.path(), 30.0).err().unwrap();
        assert_eq!(err.exit_code(), -1);
    }

    #[test]
    fn test_unreadable_directory_is_open_failure() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("launch.mp4");
        std::fs::write(&file, b"not a directory").unwrap();

        for path in [file, dir.path().join("missing")] {
            let err = ImageSequenceSource::open(&path, 30.0).err().unwrap();
            assert!(matches!(
                err,
                crate::error::TelemetryError::Video(VideoError::OpenFailed { .. })
            ));
            assert_eq!(err.exit_code(), -1);
        }
    }
}
