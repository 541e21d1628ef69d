use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    config::TimingConfig,
    error::Result,
    liftoff::{LiftoffDetector, LiftoffState},
    ocr::OcrEngine,
    recognizer::{RecognitionResult, RegionRecognizer},
    regions::RegionCatalog,
    telemetry::record::{FieldReading, FieldValue, FlightData, TelemetryRecord},
    video::Frame,
};

/// Seconds since liftoff on a `1/quantization` grid
///
/// `delta * quantization / fps` is divided as integers, matching previously
/// extracted telemetry files: the result truncates to the grid step below the
/// exact value rather than rounding to the nearest (4 frames at 30 fps give
/// 136/1024, not 137/1024). The nominal rate is used rather than the
/// container's.
pub fn elapsed_seconds(frame_index: u64, liftoff_frame: u64, timing: &TimingConfig) -> f64 {
    let delta = frame_index as i64 - liftoff_frame as i64;
    let ticks = delta * timing.quantization as i64 / timing.nominal_fps as i64;
    (ticks as f64 / timing.quantization as f64).max(0.0)
}

/// Turns one frame into one [`TelemetryRecord`]
///
/// Owns the recognizer and the liftoff state for a run, so frames must be
/// built in increasing index order.
pub struct FrameTelemetryBuilder<E: OcrEngine> {
    catalog: RegionCatalog,
    recognizer: RegionRecognizer<E>,
    detector: LiftoffDetector,
    timing: TimingConfig,
    debug_dir: Option<PathBuf>,
}

impl<E: OcrEngine> FrameTelemetryBuilder<E> {
    pub fn new(catalog: RegionCatalog, recognizer: RegionRecognizer<E>, timing: TimingConfig) -> Self {
        Self {
            catalog,
            recognizer,
            detector: LiftoffDetector::new(),
            timing,
            debug_dir: None,
        }
    }

    /// Save the cropped regions of the next built frame into `dir`
    pub fn with_debug_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }

    pub fn liftoff_state(&self) -> LiftoffState {
        self.detector.state()
    }

    pub fn build(&mut self, frame_index: u64, frame: &Frame) -> Result<TelemetryRecord> {
        if let Some(dir) = self.debug_dir.take() {
            self.dump_regions(&dir, frame);
        }

        let mut clock = RecognitionResult::empty();
        let mut readings = Vec::with_capacity(self.catalog.len().saturating_sub(1));

        for region in self.catalog.regions() {
            let is_clock = self.catalog.is_clock(region);
            let result = self.recognizer.recognize(frame, region, is_clock)?;
            if is_clock {
                clock = result;
            } else {
                readings.push((region.name.clone(), result));
            }
        }

        let state = self.detector.observe(frame_index, &clock.raw_text);
        let mut record = TelemetryRecord::pre_liftoff(frame_index, self.catalog.clock().name.clone(), clock);

        if let LiftoffState::PostLiftoff { frame_index: liftoff_frame } = state {
            let fields = readings
                .into_iter()
                .map(|(name, result)| FieldReading {
                    value: FieldValue::from_text(&result.raw_text),
                    confidence: result.confidence,
                    name,
                })
                .collect();

            record.flight = Some(FlightData {
                fields,
                elapsed_seconds: elapsed_seconds(frame_index, liftoff_frame, &self.timing),
            });
        }

        Ok(record)
    }

    fn dump_regions(&self, dir: &Path, frame: &Frame) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("Could not create debug directory {}: {}", dir.display(), e);
            return;
        }

        for region in self.catalog.regions() {
            let path = dir.join(format!("debug_{}.png", region.name));
            // Out-of-bounds regions are reported by the recognizer right after
            let Ok(patch) = frame.crop(region) else { continue };
            match patch.save(&path) {
                Ok(()) => debug!("Saved region '{}' to {}", region.name, path.display()),
                Err(e) => warn!("Could not save {}: {}", path.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrOutput;
    use crate::regions::{Region, RegionBox};
    use image::GrayImage;
    use std::collections::VecDeque;
    use tempfile::tempdir;

    struct QueueEngine {
        outputs: VecDeque<OcrOutput>,
    }

    impl OcrEngine for QueueEngine {
        fn name(&self) -> &str {
            "queue"
        }

        fn recognize(&mut self, _image: &GrayImage, _dpi: u32) -> Result<OcrOutput> {
            Ok(self.outputs.pop_front().unwrap_or_default())
        }
    }

    fn builder(outputs: Vec<(&str, Option<f32>)>) -> FrameTelemetryBuilder<QueueEngine> {
        let catalog = RegionCatalog::new(
            vec![
                Region::new("timer", RegionBox::new(0, 0, 20, 8)),
                Region::new("speed", RegionBox::new(0, 10, 10, 8)),
                Region::new("alt", RegionBox::new(12, 10, 10, 8)),
            ],
            "timer",
        )
        .unwrap();
        let engine = QueueEngine {
            outputs: outputs.into_iter().map(|(t, c)| OcrOutput::new(t, c)).collect(),
        };
        FrameTelemetryBuilder::new(catalog, RegionRecognizer::new(engine, 300), TimingConfig::default())
    }

    #[test]
    fn test_elapsed_seconds_quantization() {
        let timing = TimingConfig::default();
        assert_eq!(elapsed_seconds(130, 100, &timing), ((30 * 1024 / 30) as f64) / 1024.0);
        assert_eq!(elapsed_seconds(130, 100, &timing), 1.0);
        assert_eq!(elapsed_seconds(100, 100, &timing), 0.0);
        assert_eq!(elapsed_seconds(101, 100, &timing), 34.0 / 1024.0);
        assert_eq!(elapsed_seconds(90, 100, &timing), 0.0);
    }

    #[test]
    fn test_elapsed_seconds_truncates_instead_of_rounding() {
        let timing = TimingConfig::default();
        // 4 * 1024 / 30 = 136.53..., rounding would give 137
        assert_eq!(elapsed_seconds(104, 100, &timing), 136.0 / 1024.0);
        assert_eq!(elapsed_seconds(104, 100, &timing), 0.1328125);
        assert_ne!(elapsed_seconds(104, 100, &timing), 137.0 / 1024.0);
    }

    #[test]
    fn test_elapsed_seconds_monotonic() {
        let timing = TimingConfig::default();
        let mut previous = 0.0;
        for frame in 50..500 {
            let elapsed = elapsed_seconds(frame, 50, &timing);
            assert!(elapsed >= previous);
            previous = elapsed;
        }
    }

    #[test]
    fn test_pre_liftoff_omits_fields() {
        let frame = Frame::new_filled(30, 20, [0, 0, 0]);
        let mut builder = builder(vec![("T-00:00:03", Some(91.0)), ("123", Some(80.0)), ("45", Some(70.0))]);

        let record = builder.build(0, &frame).unwrap();
        assert_eq!(record.clock_text, "T-00:00:03");
        assert_eq!(record.clock_confidence, 91.0);
        assert!(record.flight.is_none());
    }

    #[test]
    fn test_post_liftoff_fields_and_sentinels() {
        let frame = Frame::new_filled(30, 20, [0, 0, 0]);
        let mut builder = builder(vec![
            ("T+00:00:00", Some(97.0)), ("1 2 3", Some(80.0)), ("", None),
            ("T+00:00:01", Some(96.0)), ("-", Some(40.0)), ("450", Some(75.0)),
        ]);

        let first = builder.build(7, &frame).unwrap();
        let flight = first.flight.as_ref().unwrap();
        assert_eq!(flight.elapsed_seconds, 0.0);
        assert_eq!(first.field("speed").unwrap().value, FieldValue::Integer(123));
        assert_eq!(first.field("alt").unwrap().value, FieldValue::NaN);
        assert_eq!(first.field("alt").unwrap().confidence, -1.0);

        let second = builder.build(37, &frame).unwrap();
        assert_eq!(second.elapsed_seconds(), Some(1.0));
        assert_eq!(second.field("speed").unwrap().value, FieldValue::NaN);
        assert_eq!(second.field("speed").unwrap().confidence, 40.0);
        assert_eq!(second.field("alt").unwrap().value, FieldValue::Integer(450));
        assert_eq!(builder.liftoff_state(), LiftoffState::PostLiftoff { frame_index: 7 });
    }

    #[test]
    fn test_out_of_bounds_region_aborts_build() {
        let frame = Frame::new_filled(15, 20, [0, 0, 0]);
        let mut builder = builder(vec![]);
        assert!(builder.build(0, &frame).is_err());
    }

    #[test]
    fn test_debug_dump_only_first_frame() {
        let dir = tempdir().unwrap();
        let debug_dir = dir.path().join("regions");
        let frame = Frame::new_filled(30, 20, [10, 20, 30]);
        let mut builder = builder(vec![]).with_debug_dir(&debug_dir);

        builder.build(0, &frame).unwrap();
        assert!(debug_dir.join("debug_timer.png").exists());
        assert!(debug_dir.join("debug_alt.png").exists());

        std::fs::remove_dir_all(&debug_dir).unwrap();
        builder.build(1, &frame).unwrap();
        assert!(!debug_dir.exists());
    }
}
