//! # Overlay Telemetry
//!
//! Extract launch telemetry from the on-screen overlay of a webcast: the
//! mission clock plus vehicle speed and altitude, read frame by frame with OCR.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use overlay_telemetry::{
//!     config::Config,
//!     ocr::TesseractEngine,
//!     output::JsModuleWriter,
//!     progress::NoProgress,
//!     recognizer::RegionRecognizer,
//!     telemetry::FrameTelemetryBuilder,
//!     timeline::{FrameRange, TimelineDriver},
//!     video::FfmpegSource,
//! };
//!
//! # fn main() -> overlay_telemetry::Result<()> {
//! let config = Config::default();
//! let engine = TesseractEngine::new(config.ocr.clone())?;
//! let recognizer = RegionRecognizer::new(engine, config.ocr.dpi);
//! let builder = FrameTelemetryBuilder::new(config.regions.catalog()?, recognizer, config.timing.clone());
//!
//! let mut source = FfmpegSource::open("StarshipIFT7.mp4")?;
//! let mut sink = JsModuleWriter::create("StarshipIFT7.js", "StarshipIFT7", "StarshipIFT7.mp4")?;
//! let summary = TimelineDriver::new(builder).run(&mut source, FrameRange::all(), &mut sink, &mut NoProgress)?;
//! println!("liftoff at {:?}", summary.liftoff_frame);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`regions`] - named overlay rectangles and the designated clock region
//! - [`timecode`] - `[[HH:]MM:]SS[.ms]` parsing for the range flags
//! - [`ocr`] - preprocessing and the OCR engine seam
//! - [`recognizer`] - crop, binarize, recognize and clean one region
//! - [`liftoff`] - one-way `T+` latch
//! - [`telemetry`] - per-frame record assembly and the elapsed time base
//! - [`timeline`] - sequential frame loop
//! - [`video`], [`output`], [`progress`] - frame sources, record sinks, console status
//!
//! ## Custom OCR engines
//!
//! Anything implementing [`OcrEngine`](ocr::OcrEngine) can stand in for Tesseract:
//!
//! ```rust,no_run
//! use overlay_telemetry::ocr::{OcrEngine, OcrOutput};
//! use image::GrayImage;
//!
//! struct AlwaysZero;
//!
//! impl OcrEngine for AlwaysZero {
//!     fn name(&self) -> &str {
//!         "always-zero"
//!     }
//!
//!     fn recognize(&mut self, _image: &GrayImage, _dpi: u32) -> overlay_telemetry::Result<OcrOutput> {
//!         Ok(OcrOutput::new("0", Some(100.0)))
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod liftoff;
pub mod ocr;
pub mod output;
pub mod progress;
pub mod recognizer;
pub mod regions;
pub mod telemetry;
pub mod timecode;
pub mod timeline;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{Result, TelemetryError},
    liftoff::{LiftoffDetector, LiftoffState},
    regions::{Region, RegionBox, RegionCatalog},
    telemetry::{FrameTelemetryBuilder, TelemetryRecord},
    timeline::{FrameRange, RunSummary, TimelineDriver},
};
