use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::recognizer::RecognitionResult;
use crate::regions::confidence_key;

/// Value read from a numeric overlay field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    Integer(i64),
    /// The cleaned text was empty or did not convert; serialized as `"NaN"`
    NaN,
}

impl FieldValue {
    /// Convert cleaned OCR text, falling back to [`FieldValue::NaN`]
    pub fn from_text(text: &str) -> Self {
        text.parse::<i64>().map(Self::Integer).unwrap_or(Self::NaN)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::NaN => write!(f, "NaN"),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(value) => serializer.serialize_i64(*value),
            Self::NaN => serializer.serialize_str("NaN"),
        }
    }
}

/// One numeric field of a post-liftoff record
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReading {
    pub name: String,
    pub value: FieldValue,
    pub confidence: f32,
}

/// Readings that only exist once liftoff has been seen
///
/// Keeping the fields and the elapsed time in one optional block means a
/// record has either all of them or none.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightData {
    pub fields: Vec<FieldReading>,
    pub elapsed_seconds: f64,
}

/// Telemetry extracted from one frame
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub frame_index: u64,
    /// Name of the clock region, used as the output key
    pub clock_name: String,
    pub clock_text: String,
    pub clock_confidence: f32,
    pub flight: Option<FlightData>,
}

impl TelemetryRecord {
    pub fn pre_liftoff<S: Into<String>>(frame_index: u64, clock_name: S, clock: RecognitionResult) -> Self {
        Self {
            frame_index,
            clock_name: clock_name.into(),
            clock_text: clock.raw_text,
            clock_confidence: clock.confidence,
            flight: None,
        }
    }

    pub fn is_post_liftoff(&self) -> bool {
        self.flight.is_some()
    }

    pub fn elapsed_seconds(&self) -> Option<f64> {
        self.flight.as_ref().map(|flight| flight.elapsed_seconds)
    }

    pub fn field(&self, name: &str) -> Option<&FieldReading> {
        self.flight
            .as_ref()
            .and_then(|flight| flight.fields.iter().find(|field| field.name == name))
    }
}

impl Serialize for TelemetryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let field_count = self.flight.as_ref().map(|f| f.fields.len() * 2 + 1).unwrap_or(0);
        let mut map = serializer.serialize_map(Some(3 + field_count))?;

        map.serialize_entry("frame", &self.frame_index)?;
        map.serialize_entry(&self.clock_name, &self.clock_text)?;
        map.serialize_entry(&confidence_key(&self.clock_name), &self.clock_confidence)?;

        if let Some(flight) = &self.flight {
            for field in &flight.fields {
                map.serialize_entry(&field.name, &field.value)?;
                map.serialize_entry(&confidence_key(&field.name), &field.confidence)?;
            }
            map.serialize_entry("timeInSec", &flight.elapsed_seconds)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_from_text() {
        assert_eq!(FieldValue::from_text("27450"), FieldValue::Integer(27450));
        assert_eq!(FieldValue::from_text("007"), FieldValue::Integer(7));
        assert_eq!(FieldValue::from_text(""), FieldValue::NaN);
        assert_eq!(FieldValue::from_text("12a"), FieldValue::NaN);
        assert_eq!(FieldValue::from_text("99999999999999999999999"), FieldValue::NaN);
    }

    #[test]
    fn test_pre_liftoff_record_json() {
        let record = TelemetryRecord::pre_liftoff(
            4,
            "timer",
            RecognitionResult { raw_text: "T-00:00:09".to_string(), confidence: 90.5 },
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "frame": 4, "timer": "T-00:00:09", "timer_confidence": 90.5 })
        );
    }

    #[test]
    fn test_post_liftoff_record_json_keeps_order() {
        let record = TelemetryRecord {
            frame_index: 130,
            clock_name: "timer".to_string(),
            clock_text: "T+00:00:01".to_string(),
            clock_confidence: 96.0,
            flight: Some(FlightData {
                fields: vec![
                    FieldReading { name: "ship_speed".to_string(), value: FieldValue::Integer(12), confidence: 88.0 },
                    FieldReading { name: "ship_alt".to_string(), value: FieldValue::NaN, confidence: -1.0 },
                ],
                elapsed_seconds: 1.0,
            }),
        };

        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(
            text,
            r#"{"frame":130,"timer":"T+00:00:01","timer_confidence":96.0,"ship_speed":12,"ship_speed_confidence":88.0,"ship_alt":"NaN","ship_alt_confidence":-1.0,"timeInSec":1.0}"#
        );
        assert_eq!(record.field("ship_alt").unwrap().value, FieldValue::NaN);
        assert_eq!(record.elapsed_seconds(), Some(1.0));
    }
}
