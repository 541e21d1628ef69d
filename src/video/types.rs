use image::{imageops, ImageBuffer, Rgb, RgbImage};

use crate::error::{ConfigError, Result};
use crate::regions::Region;

/// A single decoded video frame
///
/// Thin wrapper around an RGB image buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| {
            Rgb(color)
        });
        Self { buffer }
    }

    /// Create a frame from packed rgb24 bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data)
            .map(|buffer| Self { buffer })
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Copy out the pixels covered by a region
    ///
    /// A box reaching past the frame edge is a configuration error; it is
    /// never clamped.
    pub fn crop(&self, region: &Region) -> Result<RgbImage> {
        let bbox = region.bbox;
        if !bbox.fits_within(self.width(), self.height()) {
            return Err(ConfigError::RegionOutOfBounds {
                region: region.name.clone(),
                x: bbox.x,
                y: bbox.y,
                width: bbox.width,
                height: bbox.height,
                frame_width: self.width(),
                frame_height: self.height(),
            }
            .into());
        }

        Ok(imageops::crop_imm(&self.buffer, bbox.x, bbox.y, bbox.width, bbox.height).to_image())
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> std::result::Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

/// Stream properties reported by a frame source
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub fps: f64,
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
}

impl VideoMetadata {
    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::RegionBox;

    #[test]
    fn test_crop_inside_frame() {
        let mut frame = Frame::new_filled(40, 30, [0, 0, 0]);
        frame.set_pixel(12, 7, [255, 255, 255]);

        let region = Region::new("speed", RegionBox::new(10, 5, 8, 4));
        let patch = frame.crop(&region).unwrap();
        assert_eq!(patch.dimensions(), (8, 4));
        assert_eq!(patch.get_pixel(2, 2).0, [255, 255, 255]);
        assert_eq!(patch.get_pixel(0, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_crop_out_of_bounds_fails() {
        let frame = Frame::new_filled(40, 30, [0, 0, 0]);
        let region = Region::new("alt", RegionBox::new(35, 5, 8, 4));
        assert!(frame.crop(&region).is_err());
    }

    #[test]
    fn test_from_rgb_bytes_checks_length() {
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_rgb_bytes(2, 2, vec![0; 11]).is_none());
    }

    #[test]
    fn test_metadata_duration() {
        let metadata = VideoMetadata { fps: 30.0, width: 1920, height: 1080, frame_count: 900 };
        assert_eq!(metadata.duration(), 30.0);
    }
}
