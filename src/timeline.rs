use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    error::{Result, VideoError},
    ocr::OcrEngine,
    output::TelemetrySink,
    progress::ProgressReporter,
    telemetry::FrameTelemetryBuilder,
    video::FrameSource,
};

/// Inclusive range of frame indices to process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    pub start: u64,
    /// `None` runs until the source is exhausted
    pub end: Option<u64>,
}

impl FrameRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Everything from the first frame
    pub fn all() -> Self {
        Self { start: 0, end: None }
    }

    /// Convert `-ss` / `-to` seconds into frame indices at the source rate
    pub fn from_times(start: Option<f64>, end: Option<f64>, fps: f64) -> Self {
        let to_frame = |seconds: f64| (seconds * fps).floor().max(0.0) as u64;
        Self {
            start: start.map(to_frame).unwrap_or(0),
            end: end.map(to_frame),
        }
    }

    /// Reject a start at or past the end of a `total`-frame source, or an end before the start
    pub fn validate(&self, total: u64) -> Result<()> {
        if self.start >= total {
            return Err(VideoError::StartBeyondEnd { start: self.start, total }.into());
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(VideoError::InvalidRange { start: self.start, end }.into());
            }
        }
        Ok(())
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub last_frame: Option<u64>,
    pub liftoff_frame: Option<u64>,
    /// The source ran out before the end of the range
    pub exhausted: bool,
    /// A stop request ended the run between frames
    pub stopped_early: bool,
}

/// Drives frames through the builder strictly in order, one at a time
pub struct TimelineDriver<E: OcrEngine> {
    builder: FrameTelemetryBuilder<E>,
    stop: Option<Arc<AtomicBool>>,
}

impl<E: OcrEngine> TimelineDriver<E> {
    pub fn new(builder: FrameTelemetryBuilder<E>) -> Self {
        Self { builder, stop: None }
    }

    /// Flag checked between frames; setting it ends the run after the current frame
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Process `range` from `source`, forwarding every record to `sink`
    ///
    /// The sink is finished when the run ends normally (end of range, end of
    /// stream or stop request); on error it is left as is.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        range: FrameRange,
        sink: &mut dyn TelemetrySink,
        progress: &mut dyn ProgressReporter,
    ) -> Result<RunSummary> {
        if !source.is_open() {
            return Err(VideoError::OpenFailed {
                path: "frame source".to_string(),
                reason: "source is not open".to_string(),
            }
            .into());
        }

        let metadata = source.metadata();
        let total = metadata.frame_count;
        range.validate(total)?;

        info!(
            "Processing frames {}..={} of {} ({}x{}, {:.1}s)",
            range.start,
            range.end.map(|e| e.to_string()).unwrap_or_else(|| "end".to_string()),
            total,
            metadata.width,
            metadata.height,
            metadata.duration()
        );

        source.seek(range.start)?;

        let mut summary = RunSummary::default();
        let mut frame_index = range.start;

        loop {
            if range.end.is_some_and(|end| frame_index > end) {
                break;
            }
            if self.stop_requested() {
                info!("Stop requested, ending run before frame {}", frame_index);
                summary.stopped_early = true;
                break;
            }

            let Some(frame) = source.read_next()? else {
                debug!("Frame source exhausted at frame {}", frame_index);
                summary.exhausted = true;
                break;
            };

            let record = self.builder.build(frame_index, &frame)?;
            sink.write_record(&record)?;
            progress.report(&record);

            summary.frames_processed += 1;
            summary.last_frame = Some(frame_index);
            frame_index += 1;
        }

        progress.finish();
        sink.finish()?;

        summary.liftoff_frame = self.builder.liftoff_state().liftoff_frame();
        info!(
            "Processed {} frames (liftoff: {})",
            summary.frames_processed,
            summary
                .liftoff_frame
                .map(|f| format!("frame {}", f))
                .unwrap_or_else(|| "not detected".to_string())
        );
        Ok(summary)
    }
}
