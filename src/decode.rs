//! Payload decoding.
//!
//! Turns raw transport payloads into [`Event`]s. The payload format is fixed
//! by configuration; the decoder never sniffs content to pick one.

use serde_json::Value;

use crate::config::DecoderSettings;
use crate::error::DecodeError;
use crate::event::Event;

/// Wire format of incoming payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// A JSON object with named category and metric fields.
    #[default]
    Json,
    /// A delimited line with category and metric at fixed positions.
    Delimited,
}

/// Field layout for the chosen format.
#[derive(Debug, Clone, PartialEq)]
enum Layout {
    Keyed {
        category_field: String,
        metric_field: Option<String>,
    },
    Delimited {
        delimiter: char,
        category_index: usize,
        metric_index: Option<usize>,
    },
}

/// Decodes raw payloads into events.
///
/// # Example
///
/// ```
/// use streamchart::Decoder;
///
/// let decoder = Decoder::json();
/// let event = decoder.decode(br#"{"category":"loved","metric":4.5}"#).unwrap();
/// assert_eq!(event.category(), "loved");
/// assert_eq!(event.metric(), Some(4.5));
///
/// assert!(decoder.decode(b"not json").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Decoder {
    layout: Layout,
    require_metric: bool,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::json()
    }
}

impl Decoder {
    /// JSON objects with `category` and optional `metric` fields.
    pub fn json() -> Self {
        Self::keyed("category", Some("metric"))
    }

    /// JSON objects with custom field names.
    pub fn keyed(category_field: &str, metric_field: Option<&str>) -> Self {
        Self {
            layout: Layout::Keyed {
                category_field: category_field.to_string(),
                metric_field: metric_field.map(str::to_string),
            },
            require_metric: false,
        }
    }

    /// Delimited lines, e.g. `loved,42.0` with `delimited(',', 0, Some(1))`.
    pub fn delimited(delimiter: char, category_index: usize, metric_index: Option<usize>) -> Self {
        Self {
            layout: Layout::Delimited {
                delimiter,
                category_index,
                metric_index,
            },
            require_metric: false,
        }
    }

    /// Reject payloads that carry no metric.
    pub fn require_metric(mut self, required: bool) -> Self {
        self.require_metric = required;
        self
    }

    /// Build a decoder from resolved configuration.
    pub fn from_settings(settings: &DecoderSettings) -> Self {
        let decoder = match settings.format {
            PayloadFormat::Json => {
                Self::keyed(&settings.category_field, settings.metric_field.as_deref())
            }
            PayloadFormat::Delimited => Self::delimited(
                settings.delimiter,
                settings.category_index,
                settings.metric_index,
            ),
        };
        decoder.require_metric(settings.require_metric)
    }

    /// Decode one payload into an event stamped with the current instant.
    pub fn decode(&self, raw: &[u8]) -> Result<Event, DecodeError> {
        let (category, metric) = match &self.layout {
            Layout::Keyed {
                category_field,
                metric_field,
            } => decode_keyed(raw, category_field, metric_field.as_deref())?,
            Layout::Delimited {
                delimiter,
                category_index,
                metric_index,
            } => decode_delimited(raw, *delimiter, *category_index, *metric_index)?,
        };

        if metric.is_none() && self.require_metric {
            return Err(DecodeError::MissingMetric);
        }

        Ok(Event::new(category, metric))
    }
}

fn decode_keyed(
    raw: &[u8],
    category_field: &str,
    metric_field: Option<&str>,
) -> Result<(String, Option<f64>), DecodeError> {
    let value: Value =
        serde_json::from_slice(raw).map_err(|e| DecodeError::Json(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(DecodeError::Json("expected a JSON object".to_string()));
    };

    let category = match object.get(category_field) {
        None | Some(Value::Null) => return Err(DecodeError::MissingCategory),
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(DecodeError::MissingCategory)
        }
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(DecodeError::CategoryNotString(category_field.to_string())),
    };

    let metric = match metric_field.and_then(|field| object.get(field)) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            let v = n
                .as_f64()
                .ok_or_else(|| DecodeError::InvalidMetric(n.to_string()))?;
            Some(finite(v)?)
        }
        Some(Value::String(s)) => Some(parse_metric(s)?),
        Some(other) => return Err(DecodeError::InvalidMetric(other.to_string())),
    };

    Ok((category, metric))
}

fn decode_delimited(
    raw: &[u8],
    delimiter: char,
    category_index: usize,
    metric_index: Option<usize>,
) -> Result<(String, Option<f64>), DecodeError> {
    let line = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
    let line = line.trim_end_matches(['\r', '\n']);
    let fields: Vec<&str> = line.split(delimiter).map(str::trim).collect();

    let category = fields
        .get(category_index)
        .filter(|field| !field.is_empty())
        .ok_or(DecodeError::MissingCategory)?;

    let metric = match metric_index.and_then(|idx| fields.get(idx)) {
        Some(field) if !field.is_empty() => Some(parse_metric(field)?),
        _ => None,
    };

    Ok((category.to_string(), metric))
}

fn parse_metric(s: &str) -> Result<f64, DecodeError> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| DecodeError::InvalidMetric(s.to_string()))?;
    finite(v)
}

fn finite(v: f64) -> Result<f64, DecodeError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(DecodeError::NonFiniteMetric(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_category_only() {
        let event = Decoder::json().decode(br#"{"category":"a"}"#).unwrap();
        assert_eq!(event.category(), "a");
        assert_eq!(event.metric(), None);
    }

    #[test]
    fn test_json_numeric_string_metric() {
        let event = Decoder::json()
            .decode(br#"{"category":"saw","metric":" 12.5 "}"#)
            .unwrap();
        assert_eq!(event.metric(), Some(12.5));
    }

    #[test]
    fn test_json_custom_fields() {
        let decoder = Decoder::keyed("keyword_mentioned", Some("sentiment"));
        let event = decoder
            .decode(br#"{"keyword_mentioned":"Python","sentiment":0.8,"message":"x"}"#)
            .unwrap();
        assert_eq!(event.category(), "Python");
        assert_eq!(event.metric(), Some(0.8));
    }

    #[test]
    fn test_json_rejects_malformed_and_non_object() {
        let decoder = Decoder::json();
        assert!(matches!(decoder.decode(b"not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decoder.decode(br#""not json""#), Err(DecodeError::Json(_))));
        assert!(matches!(decoder.decode(b"[1,2]"), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_json_rejects_missing_or_empty_category() {
        let decoder = Decoder::json();
        assert_eq!(
            decoder.decode(br#"{"metric":1}"#),
            Err(DecodeError::MissingCategory)
        );
        assert_eq!(
            decoder.decode(br#"{"category":"  "}"#),
            Err(DecodeError::MissingCategory)
        );
        assert_eq!(
            decoder.decode(br#"{"category":7}"#),
            Err(DecodeError::CategoryNotString("category".to_string()))
        );
    }

    #[test]
    fn test_json_rejects_bad_metric() {
        let decoder = Decoder::json();
        assert!(matches!(
            decoder.decode(br#"{"category":"a","metric":"lots"}"#),
            Err(DecodeError::InvalidMetric(_))
        ));
        assert!(matches!(
            decoder.decode(br#"{"category":"a","metric":[1]}"#),
            Err(DecodeError::InvalidMetric(_))
        ));
        assert!(matches!(
            decoder.decode(br#"{"category":"a","metric":"NaN"}"#),
            Err(DecodeError::NonFiniteMetric(_))
        ));
    }

    #[test]
    fn test_required_metric() {
        let decoder = Decoder::json().require_metric(true);
        assert_eq!(
            decoder.decode(br#"{"category":"a"}"#),
            Err(DecodeError::MissingMetric)
        );
        assert!(decoder.decode(br#"{"category":"a","metric":3}"#).is_ok());
    }

    #[test]
    fn test_category_is_not_normalized() {
        let decoder = Decoder::json();
        let upper = decoder.decode(br#"{"category":"Loved"}"#).unwrap();
        let lower = decoder.decode(br#"{"category":"loved"}"#).unwrap();
        assert_ne!(upper.category(), lower.category());
    }

    #[test]
    fn test_delimited() {
        let decoder = Decoder::delimited(',', 1, Some(3));
        let event = decoder.decode(b"2025-01-01, found ,x, 71.5\r\n").unwrap();
        assert_eq!(event.category(), "found");
        assert_eq!(event.metric(), Some(71.5));
    }

    #[test]
    fn test_delimited_missing_fields() {
        let decoder = Decoder::delimited('|', 0, Some(1));
        let event = decoder.decode(b"tried").unwrap();
        assert_eq!(event.metric(), None);
        assert_eq!(decoder.decode(b"|5"), Err(DecodeError::MissingCategory));
        assert!(matches!(
            decoder.decode(b"tried|five"),
            Err(DecodeError::InvalidMetric(_))
        ));
        assert_eq!(decoder.decode(&[0xff, 0xfe]), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_from_settings_selects_format() {
        let settings = DecoderSettings {
            format: PayloadFormat::Delimited,
            delimiter: ';',
            category_index: 0,
            metric_index: None,
            ..DecoderSettings::default()
        };
        let decoder = Decoder::from_settings(&settings);
        // A JSON-looking line is still read as delimited text.
        let event = decoder.decode(br#"{"category":"a"}"#).unwrap();
        assert_eq!(event.category(), r#"{"category":"a"}"#);
    }
}
