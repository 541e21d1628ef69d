use thiserror::Error;

/// Main error type for the overlay telemetry extractor
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Video source error: {0}")]
    Video(#[from] VideoError),

    #[error("OCR engine error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Time code error: {0}")]
    TimeCode(#[from] TimeCodeError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Frame source errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to open video source: {path} ({reason})")]
    OpenFailed { path: String, reason: String },

    #[error("Video decoding failed: {reason}")]
    DecodingFailed { reason: String },

    #[error("Seek to frame {frame} failed: {reason}")]
    SeekFailed { frame: u64, reason: String },

    #[error("Start frame {start} is beyond the end of the video ({total} frames)")]
    StartBeyondEnd { start: u64, total: u64 },

    #[error("Invalid frame range: start frame {start} is after end frame {end}")]
    InvalidRange { start: u64, end: u64 },
}

/// OCR engine errors
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Could not initialize OCR engine: {reason}")]
    InitFailed { reason: String },

    #[error("OCR invocation failed: {reason}")]
    RecognitionFailed { reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Region '{region}' ({x},{y} {width}x{height}) lies outside the {frame_width}x{frame_height} frame")]
    RegionOutOfBounds {
        region: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
}

/// Time code parsing errors
#[derive(Error, Debug, PartialEq)]
pub enum TimeCodeError {
    #[error("Invalid time code '{input}': expected [[HH:]MM:]SS[.ms]")]
    InvalidFormat { input: String },
}

/// Output artifact errors
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output file: {path}")]
    CreateFailed { path: String },

    #[error("Failed to serialize record for frame {frame}: {reason}")]
    SerializeFailed { frame: u64, reason: String },

    #[error("Output already finalized")]
    AlreadyFinished,
}

/// Convenience type alias for Results using TelemetryError
pub type Result<T> = std::result::Result<T, TelemetryError>;

impl TelemetryError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Process exit code for this error
    ///
    /// An unreadable video or an OCR engine that cannot start is an abnormal
    /// termination (`-1`); every other failure is a plain usage/configuration
    /// error (`1`).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Video(VideoError::OpenFailed { .. }) => -1,
            Self::Ocr(OcrError::InitFailed { .. }) => -1,
            _ => 1,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::OpenFailed { path, .. }) => {
                format!("Error: Could not open video file '{}'.", path)
            }
            Self::Video(VideoError::StartBeyondEnd { start, total }) => {
                format!(
                    "Error: Start time (frame {}) is beyond the video duration ({} frames).",
                    start, total
                )
            }
            Self::Ocr(OcrError::InitFailed { reason }) => {
                format!("Could not initialize Tesseract OCR: {}", reason)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
