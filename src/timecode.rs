//! Parsing of `[[HH:]MM:]SS[.ms]` time codes used by the `-ss` / `-to` flags.

use crate::error::TimeCodeError;

/// Parse a time code into seconds.
///
/// One segment is seconds, two are `MM:SS`, three are `HH:MM:SS`. Every
/// segment is read as a real number so fractional seconds are allowed.
/// Segments must be non-negative; a leading sign is not interpreted here.
pub fn parse(text: &str) -> Result<f64, TimeCodeError> {
    let invalid = || TimeCodeError::InvalidFormat { input: text.to_string() };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let segments: Vec<&str> = trimmed.split(':').collect();
    if segments.len() > 3 {
        return Err(invalid());
    }

    let mut values = Vec::with_capacity(segments.len());
    for segment in &segments {
        // f64::from_str accepts "inf", "NaN" and signs, none of which are time
        if segment.is_empty() || !segment.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(invalid());
        }
        let value: f64 = segment.parse().map_err(|_| invalid())?;
        values.push(value);
    }

    let seconds = match values.as_slice() {
        [s] => *s,
        [m, s] => m * 60.0 + s,
        [h, m, s] => h * 3600.0 + m * 60.0 + s,
        _ => return Err(invalid()),
    };

    Ok(seconds)
}
