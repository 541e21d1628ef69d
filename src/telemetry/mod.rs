//! # Telemetry Module
//!
//! Per-frame record assembly: every region is read, the clock reading drives
//! the liftoff latch, and post-liftoff frames get numeric fields plus the
//! quantized time since liftoff.

pub mod builder;
pub mod record;

pub use builder::{elapsed_seconds, FrameTelemetryBuilder};
pub use record::{FieldReading, FieldValue, FlightData, TelemetryRecord};
