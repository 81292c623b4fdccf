/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::protocol;
use crate::tag::TagMap;

/// Max length of the escaped series key (measurement and tags) accepted by InfluxDB.
pub const MAX_SERIES_KEY_LENGTH: usize = 65535;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(i) => itoa::Buffer::new().format(*i).fmt(f),
            FieldValue::Float(v) => ryu::Buffer::new().format(*v).fmt(f),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PointError {
    #[error("point without fields is unsupported")]
    NoField,
    #[error("empty field key")]
    EmptyFieldKey,
    #[error("field key {0} is reserved")]
    ReservedFieldKey(String),
    #[error("empty tag key")]
    EmptyTagKey,
    #[error("newline is not allowed in {0}")]
    NewlineNotAllowed(&'static str),
    #[error("trailing backslash is not allowed in {0}")]
    TrailingBackslash(&'static str),
    #[error("{value} is an unsupported value for field {key}")]
    UnsupportedFloat { key: String, value: f64 },
    #[error("series key length {0} exceeds {MAX_SERIES_KEY_LENGTH}")]
    SeriesKeyTooLong(usize),
}

/// A trailing `\` would escape the separator written after it.
fn check_text(s: &str, part: &'static str) -> Result<(), PointError> {
    if s.contains('\n') {
        return Err(PointError::NewlineNotAllowed(part));
    }
    if s.ends_with('\\') {
        return Err(PointError::TrailingBackslash(part));
    }
    Ok(())
}

/// A single line of the line protocol.
#[derive(Clone, Debug)]
pub struct DataPoint {
    measurement: Arc<str>,
    tags: Arc<TagMap>,
    fields: BTreeMap<String, FieldValue>,
    time: DateTime<Utc>,
}

impl DataPoint {
    /// Build a point, checking that it can be encoded.
    ///
    /// An empty measurement is accepted here, the server will reject it on write.
    pub fn new(
        measurement: Arc<str>,
        tags: Arc<TagMap>,
        fields: BTreeMap<String, FieldValue>,
        time: DateTime<Utc>,
    ) -> Result<Self, PointError> {
        if fields.is_empty() {
            return Err(PointError::NoField);
        }
        check_text(&measurement, "measurement")?;
        for (k, v) in tags.iter() {
            if k.is_empty() {
                return Err(PointError::EmptyTagKey);
            }
            check_text(k, "tag key")?;
            check_text(v, "tag value")?;
        }
        for (key, value) in &fields {
            if key.is_empty() {
                return Err(PointError::EmptyFieldKey);
            }
            if key == "time" {
                return Err(PointError::ReservedFieldKey(key.clone()));
            }
            check_text(key, "field key")?;
            if let FieldValue::Float(f) = value
                && !f.is_finite()
            {
                return Err(PointError::UnsupportedFloat {
                    key: key.clone(),
                    value: *f,
                });
            }
        }

        let key_len = protocol::escaped_measurement_len(&measurement) + tags.encoded_len();
        if key_len > MAX_SERIES_KEY_LENGTH {
            return Err(PointError::SeriesKeyTooLong(key_len));
        }

        Ok(DataPoint {
            measurement,
            tags,
            fields,
            time,
        })
    }

    /// Shortcut for a point holding a single field.
    pub fn with_field(
        measurement: Arc<str>,
        tags: Arc<TagMap>,
        key: &str,
        value: FieldValue,
        time: DateTime<Utc>,
    ) -> Result<Self, PointError> {
        let mut fields = BTreeMap::new();
        fields.insert(key.to_string(), value);
        DataPoint::new(measurement, tags, fields, time)
    }

    #[inline]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    #[inline]
    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    #[inline]
    pub fn time(&self) -> &DateTime<Utc> {
        &self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement() -> Arc<str> {
        Arc::from("app")
    }

    #[test]
    fn single_field() {
        let tags = Arc::new(TagMap::from_iter([("host", "a")]));
        let time = Utc::now();
        let p = DataPoint::with_field(measurement(), tags, "hits", FieldValue::Integer(3), time)
            .unwrap();
        assert_eq!(p.measurement(), "app");
        assert_eq!(p.tags().get("host"), Some("a"));
        assert_eq!(p.field("hits"), Some(FieldValue::Integer(3)));
        assert_eq!(p.fields().count(), 1);
        assert_eq!(p.time(), &time);
    }

    #[test]
    fn invalid_tags() {
        let time = Utc::now();
        let tags = Arc::new(TagMap::from_iter([("", "x"), ("host", "a")]));
        let r = DataPoint::with_field(measurement(), tags, "v", FieldValue::Integer(1), time);
        assert_eq!(r.unwrap_err(), PointError::EmptyTagKey);

        let tags = Arc::new(TagMap::from_iter([("host", "a\\")]));
        let r = DataPoint::with_field(measurement(), tags, "v", FieldValue::Integer(1), time);
        assert_eq!(r.unwrap_err(), PointError::TrailingBackslash("tag value"));

        let tags = Arc::new(TagMap::from_iter([("host", "a\nb")]));
        let r = DataPoint::with_field(measurement(), tags, "v", FieldValue::Integer(1), time);
        assert_eq!(r.unwrap_err(), PointError::NewlineNotAllowed("tag value"));

        // empty values are left out of the series key
        let tags = Arc::new(TagMap::from_iter([("host", ""), ("app", "demo")]));
        let p = DataPoint::with_field(measurement(), tags, "v", FieldValue::Integer(1), time)
            .unwrap();
        assert_eq!(p.tags().len(), 2);
    }

    #[test]
    fn invalid() {
        let tags = Arc::new(TagMap::default());
        let time = Utc::now();

        let r = DataPoint::new(measurement(), tags.clone(), BTreeMap::new(), time);
        assert_eq!(r.unwrap_err(), PointError::NoField);

        let r = DataPoint::with_field(
            measurement(),
            tags.clone(),
            "",
            FieldValue::Integer(1),
            time,
        );
        assert_eq!(r.unwrap_err(), PointError::EmptyFieldKey);

        let r = DataPoint::with_field(
            measurement(),
            tags.clone(),
            "time",
            FieldValue::Integer(1),
            time,
        );
        assert!(matches!(r, Err(PointError::ReservedFieldKey(_))));

        let r = DataPoint::with_field(
            measurement(),
            tags.clone(),
            "a\nb",
            FieldValue::Integer(1),
            time,
        );
        assert!(matches!(r, Err(PointError::NewlineNotAllowed(_))));

        let r = DataPoint::with_field(
            measurement(),
            tags.clone(),
            "name\\",
            FieldValue::Integer(1),
            time,
        );
        assert_eq!(r.unwrap_err(), PointError::TrailingBackslash("field key"));

        let r = DataPoint::with_field(
            Arc::from("app\\"),
            tags.clone(),
            "v",
            FieldValue::Integer(1),
            time,
        );
        assert_eq!(r.unwrap_err(), PointError::TrailingBackslash("measurement"));

        let r = DataPoint::with_field(measurement(), tags.clone(), "v", f64::NAN.into(), time);
        let e = r.unwrap_err();
        assert_eq!(e.to_string(), "NaN is an unsupported value for field v");

        let r = DataPoint::with_field(
            measurement(),
            tags,
            "v",
            f64::NEG_INFINITY.into(),
            time,
        );
        assert!(matches!(r, Err(PointError::UnsupportedFloat { .. })));
    }

    #[test]
    fn key_too_long() {
        let long_value = "v".repeat(MAX_SERIES_KEY_LENGTH);
        let tags = Arc::new(TagMap::from_iter([("k", long_value)]));
        let r = DataPoint::with_field(
            measurement(),
            tags,
            "v",
            FieldValue::Integer(1),
            Utc::now(),
        );
        assert!(matches!(r, Err(PointError::SeriesKeyTooLong(_))));
    }

    #[test]
    fn empty_measurement() {
        let r = DataPoint::with_field(
            Arc::from(""),
            Arc::new(TagMap::default()),
            "v",
            FieldValue::Integer(1),
            Utc::now(),
        );
        assert!(r.is_ok());
    }
}
