use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{OutputError, Result};
use crate::telemetry::TelemetryRecord;

/// Consumer of the record sequence, in frame order
pub trait TelemetrySink {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<()>;

    /// Close the artifact; called once when the run ends normally
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl TelemetrySink for Vec<TelemetryRecord> {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes records as a JavaScript module exporting one array literal
///
/// ```text
/// export const Flight7 = [
/// { ...record... },
/// ];
/// ```
///
/// The file is truncated on creation. Every element is followed by `,`.
pub struct JsModuleWriter<W: Write> {
    out: W,
    include_pre_liftoff: bool,
    records_written: usize,
    finished: bool,
}

impl JsModuleWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the module header
    pub fn create<P: AsRef<Path>>(path: P, export_name: &str, source: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|_| OutputError::CreateFailed { path: path.display().to_string() })?;
        info!("Writing telemetry to {}", path.display());
        Self::new(BufWriter::new(file), export_name, source)
    }
}

impl<W: Write> JsModuleWriter<W> {
    pub fn new(mut out: W, export_name: &str, source: &str) -> Result<Self> {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(out, "// Telemetry extracted from {} on {}", source, generated)?;
        writeln!(out, "export const {} = [", export_name)?;
        Ok(Self {
            out,
            include_pre_liftoff: false,
            records_written: 0,
            finished: false,
        })
    }

    /// Also write records from before liftoff
    pub fn include_pre_liftoff(mut self, include: bool) -> Self {
        self.include_pre_liftoff = include;
        self
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TelemetrySink for JsModuleWriter<W> {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<()> {
        if self.finished {
            return Err(OutputError::AlreadyFinished.into());
        }
        if !record.is_post_liftoff() && !self.include_pre_liftoff {
            return Ok(());
        }

        let json = serde_json::to_string_pretty(record).map_err(|e| OutputError::SerializeFailed {
            frame: record.frame_index,
            reason: e.to_string(),
        })?;
        writeln!(self.out, "{},", json)?;
        // flushed per record so an interrupted run leaves usable output
        self.out.flush()?;
        self.records_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        writeln!(self.out, "];")?;
        self.out.flush()?;
        self.finished = true;
        Ok(())
    }
}

/// JavaScript identifier derived from a video file name
///
/// `StarshipIFT7.mp4` becomes `StarshipIFT7`; other characters become `_`
/// and a leading digit gets a `_` prefix.
pub fn export_name_for(video_path: &Path) -> String {
    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("telemetry");

    let mut name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();

    if name.is_empty() {
        name.push_str("telemetry");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Default output path: `<video stem>.js` in the working directory
pub fn default_output_path(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("telemetry");
    PathBuf::from(format!("{}.js", stem))
}
