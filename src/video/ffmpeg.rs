use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::source::FrameSource;
use crate::video::types::{Frame, VideoMetadata};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Frame source backed by an `ffmpeg` child process emitting raw rgb24 frames
///
/// Metadata comes from `ffprobe`; both executables must be on `PATH`.
pub struct FfmpegSource {
    path: PathBuf,
    metadata: VideoMetadata,
    decoder: Option<Decoder>,
    next_index: u64,
}

struct Decoder {
    child: Child,
    stdout: ChildStdout,
}

impl FfmpegSource {
    /// Probe the file and prepare for decoding
    ///
    /// Fails with `VideoError::OpenFailed` when ffprobe is missing, the file
    /// cannot be read or it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = probe(path)?;

        info!(
            "Opened {}: {}x{} @ {:.3} fps, {} frames",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.frame_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            metadata,
            decoder: None,
            next_index: 0,
        })
    }

    fn frame_size(&self) -> usize {
        self.metadata.width as usize * self.metadata.height as usize * 3
    }

    fn spawn_decoder(&self, start_frame: u64) -> Result<Decoder> {
        let mut command = Command::new("ffmpeg");
        command.args(["-v", "error", "-nostdin"]);
        if start_frame > 0 {
            let timestamp = start_frame as f64 / self.metadata.fps;
            command.arg("-ss").arg(format!("{:.6}", timestamp));
        }
        command
            .arg("-i")
            .arg(&self.path)
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        debug!("Starting decoder at frame {} for {}", start_frame, self.path.display());

        let mut child = command.spawn().map_err(|e| VideoError::OpenFailed {
            path: self.path.display().to_string(),
            reason: format!("could not start ffmpeg: {}", e),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::DecodingFailed {
            reason: "ffmpeg stdout not captured".to_string(),
        })?;

        Ok(Decoder { child, stdout })
    }

    fn stop_decoder(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            let _ = decoder.child.kill();
            let _ = decoder.child.wait();
        }
    }
}

impl FrameSource for FfmpegSource {
    fn is_open(&self) -> bool {
        self.metadata.width > 0 && self.metadata.height > 0
    }

    fn frame_rate(&self) -> f64 {
        self.metadata.fps
    }

    fn total_frame_count(&self) -> u64 {
        self.metadata.frame_count
    }

    fn seek(&mut self, frame_index: u64) -> Result<()> {
        if self.decoder.is_some() && frame_index == self.next_index {
            return Ok(());
        }
        self.stop_decoder();
        self.next_index = frame_index;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Frame>> {
        if self.decoder.is_none() {
            self.decoder = Some(self.spawn_decoder(self.next_index)?);
        }

        let mut buffer = vec![0u8; self.frame_size()];
        let read = match self.decoder.as_mut() {
            Some(decoder) => decoder.stdout.read_exact(&mut buffer),
            None => return Ok(None),
        };

        match read {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                debug!("Decoder reached end of stream at frame {}", self.next_index);
                self.stop_decoder();
                return Ok(None);
            }
            Err(e) => {
                self.stop_decoder();
                return Err(VideoError::DecodingFailed { reason: e.to_string() }.into());
            }
        }

        let frame = Frame::from_rgb_bytes(self.metadata.width, self.metadata.height, buffer)
            .ok_or_else(|| VideoError::DecodingFailed {
                reason: "frame buffer size mismatch".to_string(),
            })?;
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn metadata(&self) -> VideoMetadata {
        self.metadata.clone()
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop_decoder();
    }
}

fn probe(path: &Path) -> Result<VideoMetadata> {
    let open_failed = |reason: String| VideoError::OpenFailed {
        path: path.display().to_string(),
        reason,
    };

    if !path.is_file() {
        return Err(open_failed("file does not exist".to_string()).into());
    }

    let output = Command::new("ffprobe")
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_streams",
            "-select_streams", "v:0",
        ])
        .arg(path)
        .output()
        .map_err(|e| open_failed(format!("could not run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(open_failed("ffprobe rejected the file".to_string()).into());
    }

    parse_probe_output(&output.stdout).map_err(|reason| open_failed(reason).into())
}

fn parse_probe_output(json: &[u8]) -> std::result::Result<VideoMetadata, String> {
    let probe: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| format!("invalid ffprobe output: {}", e))?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| "no video stream".to_string())?;

    let width = stream.width.filter(|w| *w > 0).ok_or_else(|| "unknown width".to_string())?;
    let height = stream.height.filter(|h| *h > 0).ok_or_else(|| "unknown height".to_string())?;

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .ok_or_else(|| "unknown frame rate".to_string())?;

    let frame_count = match stream.nb_frames.as_deref().and_then(|n| n.parse::<u64>().ok()) {
        Some(count) => count,
        None => {
            let duration = stream
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
                .ok_or_else(|| "unknown frame count".to_string())?;
            warn!("Container does not report a frame count, estimating from duration");
            (duration * fps).round() as u64
        }
    };

    Ok(VideoMetadata { fps, width, height, frame_count })
}

/// Parse an ffprobe rational like `30000/1001`
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.parse().ok()?,
    };
    (value > 0.0).then_some(value)
}
