use std::io::Write;

use tracing::debug;

use crate::regions::RegionCatalog;
use crate::telemetry::TelemetryRecord;

/// Observer of per-frame progress
pub trait ProgressReporter {
    fn report(&mut self, record: &TelemetryRecord);

    fn finish(&mut self) {}
}

/// Reporter that discards everything
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _record: &TelemetryRecord) {}
}

/// Single status line rewritten in place with `\r`
///
/// A column header is printed once, when the first post-liftoff record
/// arrives.
pub struct ConsoleProgress<W: Write> {
    out: W,
    clock_name: String,
    region_names: Vec<String>,
    header_printed: bool,
}

impl<W: Write> ConsoleProgress<W> {
    pub fn new(out: W, catalog: &RegionCatalog) -> Self {
        Self {
            out,
            clock_name: catalog.clock().name.clone(),
            region_names: catalog.regions().iter().map(|r| r.name.clone()).collect(),
            header_printed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&self) -> String {
        let mut line = format!("{:20} ", "");
        for name in &self.region_names {
            line.push_str(&format!("{:>10} ", shorten(name, 10)));
        }
        line.push_str("(Conf: ");
        for name in &self.region_names {
            line.push_str(&format!("{:>4} ", shorten(name, 4)));
        }
        line.push(')');
        line
    }

    fn status_line(&self, record: &TelemetryRecord) -> String {
        let mut line = format!("\rFrame: {:>6} Data: ", record.frame_index);

        for name in &self.region_names {
            let value = if *name == self.clock_name {
                record.clock_text.clone()
            } else {
                record
                    .field(name)
                    .map(|field| field.value.to_string())
                    .unwrap_or_default()
            };
            line.push_str(&format!("{:>10} ", value));
        }

        line.push_str("(Conf:");
        for name in &self.region_names {
            let confidence = if *name == self.clock_name {
                Some(record.clock_confidence)
            } else {
                record.field(name).map(|field| field.confidence)
            };
            match confidence {
                Some(confidence) => line.push_str(&format!(" {:>3}%", confidence as i32)),
                None => line.push_str(" --%"),
            }
        }
        line.push_str(") ");
        line
    }

    fn write_report(&mut self, record: &TelemetryRecord) -> std::io::Result<()> {
        if record.is_post_liftoff() && !self.header_printed {
            let header = self.header();
            write!(self.out, "\n{}\n", header)?;
            self.header_printed = true;
        }
        let line = self.status_line(record);
        write!(self.out, "{}", line)?;
        self.out.flush()
    }
}

impl<W: Write> ProgressReporter for ConsoleProgress<W> {
    fn report(&mut self, record: &TelemetryRecord) {
        if let Err(e) = self.write_report(record) {
            debug!("Progress output failed: {}", e);
        }
    }

    fn finish(&mut self) {
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }
}

fn shorten(name: &str, max_chars: usize) -> String {
    name.chars().take(max_chars).collect()
}
