//! # OCR Module
//!
//! Text recognition for binarized overlay patches. The engine is a
//! collaborator behind [`OcrEngine`]; the bundled implementation drives the
//! `tesseract` command line tool.

pub mod preprocess;
mod tesseract;

pub use tesseract::TesseractEngine;

use image::GrayImage;

use crate::error::Result;

/// Raw engine output for one patch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    /// Recognized text, untouched
    pub text: String,

    /// Line-level confidence in `[0, 100]`, `None` when nothing was recognized
    pub line_confidence: Option<f32>,
}

impl OcrOutput {
    pub fn new<S: Into<String>>(text: S, line_confidence: Option<f32>) -> Self {
        Self { text: text.into(), line_confidence }
    }
}

/// Text recognizer for single-line binary images
///
/// Implementations may keep internal state between calls and are driven from
/// one thread only. The character whitelist is engine configuration, fixed
/// at construction.
pub trait OcrEngine {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Recognize the text in `image`, assuming it was captured at `dpi`
    fn recognize(&mut self, image: &GrayImage, dpi: u32) -> Result<OcrOutput>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn recognize(&mut self, image: &GrayImage, dpi: u32) -> Result<OcrOutput> {
        (**self).recognize(image, dpi)
    }
}
