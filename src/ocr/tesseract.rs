use std::io::Write;
use std::process::{Command, Stdio};

use image::{codecs::png::PngEncoder, ColorType, GrayImage, ImageEncoder};
use tracing::{debug, info};

use crate::config::OcrConfig;
use crate::error::{OcrError, Result};
use crate::ocr::{OcrEngine, OcrOutput};

/// OCR engine driving the `tesseract` executable
///
/// Each call pipes a PNG-encoded patch on stdin and reads TSV output, which
/// carries per-word confidences.
pub struct TesseractEngine {
    config: OcrConfig,
}

impl TesseractEngine {
    /// Check that the executable runs and the configured language is installed
    pub fn new(config: OcrConfig) -> Result<Self> {
        let output = Command::new(&config.binary)
            .arg("--list-langs")
            .output()
            .map_err(|e| OcrError::InitFailed {
                reason: format!("could not run '{}': {}", config.binary, e),
            })?;

        if !output.status.success() {
            return Err(OcrError::InitFailed {
                reason: format!("'{} --list-langs' failed", config.binary),
            }
            .into());
        }

        // Older releases print the language list on stderr
        let listing = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        if !listing.lines().any(|line| line.trim() == config.language) {
            return Err(OcrError::InitFailed {
                reason: format!("language '{}' is not installed", config.language),
            }
            .into());
        }

        info!(
            "Tesseract ready (lang {}, psm {}, whitelist {:?})",
            config.language, config.page_segmentation_mode, config.char_whitelist
        );
        Ok(Self { config })
    }

    fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(image.as_raw(), image.width(), image.height(), ColorType::L8)
            .map_err(|e| OcrError::RecognitionFailed { reason: e.to_string() })?;
        Ok(png)
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&mut self, image: &GrayImage, dpi: u32) -> Result<OcrOutput> {
        let png = Self::encode_png(image)?;

        let mut child = Command::new(&self.config.binary)
            .args(["stdin", "stdout"])
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.page_segmentation_mode.to_string())
            .arg("--dpi")
            .arg(dpi.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", self.config.char_whitelist))
            .arg("tsv")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OcrError::RecognitionFailed { reason: e.to_string() })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .map_err(|e| OcrError::RecognitionFailed { reason: e.to_string() })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::RecognitionFailed { reason: e.to_string() })?;

        if !output.status.success() {
            return Err(OcrError::RecognitionFailed {
                reason: format!("tesseract exited with {}", output.status),
            }
            .into());
        }

        let result = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!("tesseract: {:?} ({:?})", result.text, result.line_confidence);
        Ok(result)
    }
}

/// Collect word text and the first line's mean word confidence from TSV output
///
/// Columns: level page block par line word left top width height conf text.
fn parse_tsv(tsv: &str) -> OcrOutput {
    let mut words = Vec::new();
    let mut first_line: Option<(u32, u32, u32)> = None;
    let mut confidences = Vec::new();

    for row in tsv.lines().skip(1) {
        let columns: Vec<&str> = row.split('\t').collect();
        if columns.len() < 12 || columns[0] != "5" {
            continue;
        }

        let text = columns[11].trim();
        let conf: f32 = match columns[10].trim().parse() {
            Ok(conf) => conf,
            Err(_) => continue,
        };
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let line_key = (
            columns[2].parse().unwrap_or(0),
            columns[3].parse().unwrap_or(0),
            columns[4].parse().unwrap_or(0),
        );
        if *first_line.get_or_insert(line_key) == line_key {
            confidences.push(conf);
        }
        words.push(text.to_string());
    }

    let line_confidence = if confidences.is_empty() {
        None
    } else {
        Some((confidences.iter().sum::<f32>() / confidences.len() as f32).clamp(0.0, 100.0))
    };

    OcrOutput {
        text: words.join(" "),
        line_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn test_parse_tsv_single_line() {
        let tsv = format!(
            "{}\n1\t1\t0\t0\t0\t0\t0\t0\t206\t39\t-1\t\n\
             4\t1\t1\t1\t1\t0\t5\t4\t190\t30\t-1\t\n\
             5\t1\t1\t1\t1\t1\t5\t4\t190\t30\t91.5\tT+00:01:07\n",
            HEADER
        );
        let output = parse_tsv(&tsv);
        assert_eq!(output.text, "T+00:01:07");
        assert_eq!(output.line_confidence, Some(91.5));
    }

    #[test]
    fn test_parse_tsv_averages_first_line_only() {
        let tsv = format!(
            "{}\n5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t80\t12\n\
             5\t1\t1\t1\t1\t2\t12\t0\t10\t10\t60\t34\n\
             5\t1\t1\t1\t2\t1\t0\t12\t10\t10\t10\t56\n",
            HEADER
        );
        let output = parse_tsv(&tsv);
        assert_eq!(output.text, "12 34 56");
        assert_eq!(output.line_confidence, Some(70.0));
    }

    #[test]
    fn test_parse_tsv_empty_recognition() {
        let tsv = format!("{}\n1\t1\t0\t0\t0\t0\t0\t0\t88\t26\t-1\t\n", HEADER);
        let output = parse_tsv(&tsv);
        assert_eq!(output.text, "");
        assert_eq!(output.line_confidence, None);
    }

    #[test]
    fn test_missing_binary_fails_init() {
        let config = OcrConfig {
            binary: "/nonexistent/tesseract".to_string(),
            ..OcrConfig::default()
        };
        let err = TesseractEngine::new(config).err().unwrap();
        assert_eq!(err.exit_code(), -1);
    }
}
