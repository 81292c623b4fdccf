/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
#[cfg(feature = "yaml")]
use yaml_rust::Yaml;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampPrecision {
    #[default]
    Seconds,
    MilliSeconds,
    MicroSeconds,
    NanoSeconds,
}

impl TimestampPrecision {
    /// Query value used by the v1 and v2 write API.
    pub fn v2_query_value(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::MilliSeconds => "ms",
            Self::MicroSeconds => "us",
            Self::NanoSeconds => "ns",
        }
    }

    pub fn v3_query_value(self) -> &'static str {
        match self {
            Self::Seconds => "second",
            Self::MilliSeconds => "millisecond",
            Self::MicroSeconds => "microsecond",
            Self::NanoSeconds => "nanosecond",
        }
    }

    /// Unix timestamp of `time` in this precision, truncated.
    ///
    /// Returns `None` if the value can not be represented, which only happens for
    /// nanoseconds outside of the years 1677 to 2262.
    pub fn timestamp(self, time: &DateTime<Utc>) -> Option<i64> {
        match self {
            Self::Seconds => Some(time.timestamp()),
            Self::MilliSeconds => Some(time.timestamp_millis()),
            Self::MicroSeconds => Some(time.timestamp_micros()),
            Self::NanoSeconds => time.timestamp_nanos_opt(),
        }
    }

    #[cfg(feature = "yaml")]
    pub(crate) fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::String(s) = value {
            TimestampPrecision::from_str(s)
        } else {
            Err(anyhow!(
                "yaml value type for timestamp precision should be string"
            ))
        }
    }
}

impl FromStr for TimestampPrecision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s" | "second" | "seconds" => Ok(TimestampPrecision::Seconds),
            "ms" | "millisecond" | "milliseconds" => Ok(TimestampPrecision::MilliSeconds),
            "us" | "microsecond" | "microseconds" => Ok(TimestampPrecision::MicroSeconds),
            "ns" | "nanosecond" | "nanoseconds" => Ok(TimestampPrecision::NanoSeconds),
            _ => Err(anyhow!("invalid timestamp precision: {s}")),
        }
    }
}

impl fmt::Display for TimestampPrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.v2_query_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(
            TimestampPrecision::from_str("S").unwrap(),
            TimestampPrecision::Seconds
        );
        assert_eq!(
            TimestampPrecision::from_str("milliseconds").unwrap(),
            TimestampPrecision::MilliSeconds
        );
        assert_eq!(
            TimestampPrecision::from_str("us").unwrap(),
            TimestampPrecision::MicroSeconds
        );
        assert!(TimestampPrecision::from_str("h").is_err());
    }

    #[test]
    fn timestamp() {
        let time = DateTime::from_timestamp(1_700_000_000, 987_654_321).unwrap();
        assert_eq!(
            TimestampPrecision::Seconds.timestamp(&time),
            Some(1_700_000_000)
        );
        assert_eq!(
            TimestampPrecision::MilliSeconds.timestamp(&time),
            Some(1_700_000_000_987)
        );
        assert_eq!(
            TimestampPrecision::MicroSeconds.timestamp(&time),
            Some(1_700_000_000_987_654)
        );
        assert_eq!(
            TimestampPrecision::NanoSeconds.timestamp(&time),
            Some(1_700_000_000_987_654_321)
        );
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml() {
        let v = Yaml::String("ns".to_string());
        assert_eq!(
            TimestampPrecision::parse_yaml(&v).unwrap(),
            TimestampPrecision::NanoSeconds
        );
        assert!(TimestampPrecision::parse_yaml(&Yaml::Integer(1)).is_err());
    }
}
