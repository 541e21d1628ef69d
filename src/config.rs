use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    regions::{Region, RegionBox, RegionCatalog},
};

/// Main configuration for the telemetry extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overlay regions to read
    pub regions: RegionsConfig,

    /// OCR engine settings
    pub ocr: OcrConfig,

    /// Time base settings
    pub timing: TimingConfig,

    /// Output artifact settings
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.regions.catalog()?;
        self.ocr.validate()?;
        self.timing.validate()?;
        Ok(())
    }
}

/// One region entry as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionSpec {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionSpec {
    fn new(name: &str, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { name: name.to_string(), x, y, width, height }
    }
}

impl From<&RegionSpec> for Region {
    fn from(spec: &RegionSpec) -> Self {
        Region::new(spec.name.clone(), RegionBox::new(spec.x, spec.y, spec.width, spec.height))
    }
}

/// Region layout of the broadcast overlay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsConfig {
    /// Name of the region holding the mission clock
    pub clock_region: String,

    /// Regions in output order
    pub regions: Vec<RegionSpec>,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        // 1920x1080 launch webcast overlay
        Self {
            clock_region: "timer".to_string(),
            regions: vec![
                RegionSpec::new("timer", 856, 946, 206, 39),
                RegionSpec::new("boost_speed", 333, 912, 113, 29),
                RegionSpec::new("boost_alt", 362, 948, 88, 26),
                RegionSpec::new("ship_speed", 1518, 912, 113, 29),
                RegionSpec::new("ship_alt", 1538, 948, 93, 26),
            ],
        }
    }
}

impl RegionsConfig {
    /// Build the validated region catalog
    pub fn catalog(&self) -> Result<RegionCatalog> {
        let regions = self.regions.iter().map(Region::from).collect();
        RegionCatalog::new(regions, &self.clock_region)
    }
}

/// OCR engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract executable name or path
    pub binary: String,

    /// Trained data language
    pub language: String,

    /// Source resolution reported to the engine
    pub dpi: u32,

    /// Tesseract page segmentation mode (7 = single text line)
    pub page_segmentation_mode: u8,

    /// Characters the engine may produce
    pub char_whitelist: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            dpi: 300,
            page_segmentation_mode: 7,
            char_whitelist: "0123456789T+-:".to_string(),
        }
    }
}

impl OcrConfig {
    fn validate(&self) -> Result<()> {
        if self.dpi == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ocr.dpi".to_string(),
                value: self.dpi.to_string()
            }.into());
        }

        if self.page_segmentation_mode > 13 {
            return Err(ConfigError::InvalidValue {
                key: "ocr.page_segmentation_mode".to_string(),
                value: self.page_segmentation_mode.to_string()
            }.into());
        }

        if self.char_whitelist.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "ocr.char_whitelist".to_string(),
                value: String::new()
            }.into());
        }

        Ok(())
    }
}

/// Time base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Nominal frame rate used to derive elapsed time from frame indices
    pub nominal_fps: u32,

    /// Elapsed seconds are rounded to multiples of 1/quantization
    pub quantization: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            nominal_fps: 30,
            quantization: 1024,
        }
    }
}

impl TimingConfig {
    fn validate(&self) -> Result<()> {
        if self.nominal_fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timing.nominal_fps".to_string(),
                value: self.nominal_fps.to_string()
            }.into());
        }

        if self.quantization == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timing.quantization".to_string(),
                value: self.quantization.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Output artifact configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Also write records from before liftoff
    pub include_pre_liftoff: bool,

    /// Name of the exported array; derived from the video file name when unset
    pub export_name: Option<String>,
}
