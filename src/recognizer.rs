use tracing::warn;

use crate::error::Result;
use crate::ocr::{preprocess, OcrEngine};
use crate::regions::Region;
use crate::video::Frame;

/// Confidence reported when the engine gave none
pub const NO_CONFIDENCE: f32 = -1.0;

/// Cleaned text and confidence for one region of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionResult {
    pub raw_text: String,
    /// `[0, 100]`, or [`NO_CONFIDENCE`]
    pub confidence: f32,
}

impl RecognitionResult {
    pub fn empty() -> Self {
        Self {
            raw_text: String::new(),
            confidence: NO_CONFIDENCE,
        }
    }
}

/// Strip whitespace; numeric fields additionally keep decimal digits only
///
/// Signs are dropped along with every other non-digit, so a negative reading
/// comes out as its magnitude.
pub fn clean_text(text: &str, is_clock: bool) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| is_clock || c.is_ascii_digit())
        .collect()
}

/// Crops, binarizes and reads one region at a time
pub struct RegionRecognizer<E: OcrEngine> {
    engine: E,
    dpi: u32,
}

impl<E: OcrEngine> RegionRecognizer<E> {
    pub fn new(engine: E, dpi: u32) -> Self {
        Self { engine, dpi }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Read `region` from `frame`
    ///
    /// Only an out-of-bounds region is an error. Engine failures and empty
    /// reads come back as an empty result with [`NO_CONFIDENCE`].
    pub fn recognize(&mut self, frame: &Frame, region: &Region, is_clock: bool) -> Result<RecognitionResult> {
        let patch = frame.crop(region)?;
        let binary = preprocess::prepare_patch(&patch);

        let output = match self.engine.recognize(&binary, self.dpi) {
            Ok(output) => output,
            Err(e) => {
                warn!("{} failed on region '{}': {}", self.engine.name(), region.name, e);
                return Ok(RecognitionResult::empty());
            }
        };

        Ok(RecognitionResult {
            raw_text: clean_text(&output.text, is_clock),
            confidence: output
                .line_confidence
                .map(|c| c.clamp(0.0, 100.0))
                .unwrap_or(NO_CONFIDENCE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::ocr::OcrOutput;
    use crate::regions::RegionBox;
    use image::GrayImage;

    struct FixedEngine {
        output: Option<OcrOutput>,
        last_size: Option<(u32, u32)>,
    }

    impl OcrEngine for FixedEngine {
        fn name(&self) -> &str {
            "fixed"
        }

        fn recognize(&mut self, image: &GrayImage, dpi: u32) -> Result<OcrOutput> {
            assert_eq!(dpi, 300);
            self.last_size = Some(image.dimensions());
            self.output.clone().ok_or_else(|| {
                OcrError::RecognitionFailed { reason: "engine crashed".to_string() }.into()
            })
        }
    }

    fn recognizer(output: Option<OcrOutput>) -> RegionRecognizer<FixedEngine> {
        RegionRecognizer::new(FixedEngine { output, last_size: None }, 300)
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(" T+00:01:02\n", true), "T+00:01:02");
        assert_eq!(clean_text("-1 234\n", false), "1234");
        assert_eq!(clean_text("T+:-", false), "");
    }

    #[test]
    fn test_numeric_region_is_stripped() {
        let frame = Frame::new_filled(100, 50, [0, 0, 0]);
        let region = Region::new("speed", RegionBox::new(10, 10, 30, 12));
        let mut recognizer = recognizer(Some(OcrOutput::new("-27 50\n", Some(88.0))));

        let result = recognizer.recognize(&frame, &region, false).unwrap();
        assert_eq!(result.raw_text, "2750");
        assert_eq!(result.confidence, 88.0);
        assert_eq!(recognizer.engine().last_size, Some((30, 12)));
    }

    #[test]
    fn test_clock_region_keeps_symbols() {
        let frame = Frame::new_filled(100, 50, [0, 0, 0]);
        let region = Region::new("timer", RegionBox::new(0, 0, 50, 20));
        let mut recognizer = recognizer(Some(OcrOutput::new("T- 00:00:10", Some(95.0))));

        let result = recognizer.recognize(&frame, &region, true).unwrap();
        assert_eq!(result.raw_text, "T-00:00:10");
    }

    #[test]
    fn test_missing_confidence_uses_sentinel() {
        let frame = Frame::new_filled(100, 50, [0, 0, 0]);
        let region = Region::new("alt", RegionBox::new(0, 0, 10, 10));
        let mut recognizer = recognizer(Some(OcrOutput::new("", None)));

        let result = recognizer.recognize(&frame, &region, false).unwrap();
        assert_eq!(result.raw_text, "");
        assert_eq!(result.confidence, NO_CONFIDENCE);
    }

    #[test]
    fn test_engine_failure_degrades() {
        let frame = Frame::new_filled(100, 50, [0, 0, 0]);
        let region = Region::new("alt", RegionBox::new(0, 0, 10, 10));
        let mut recognizer = recognizer(None);

        let result = recognizer.recognize(&frame, &region, false).unwrap();
        assert_eq!(result, RecognitionResult::empty());
    }

    #[test]
    fn test_out_of_bounds_region_is_fatal() {
        let frame = Frame::new_filled(100, 50, [0, 0, 0]);
        let region = Region::new("alt", RegionBox::new(95, 0, 10, 10));
        let mut recognizer = recognizer(Some(OcrOutput::new("1", Some(90.0))));

        assert!(recognizer.recognize(&frame, &region, false).is_err());
    }
}
