/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "yaml")]
use anyhow::{Context, anyhow};
#[cfg(feature = "yaml")]
use yaml_rust::Yaml;

use crate::precision::TimestampPrecision;
use crate::tag::TagMap;

const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfluxdbReporterConfig {
    pub(crate) measurement: Arc<str>,
    pub(crate) tags: Arc<TagMap>,
    pub(crate) flush_interval: Duration,
    pub(crate) write_timeout: Duration,
    pub(crate) precision: TimestampPrecision,
}

impl InfluxdbReporterConfig {
    /// A zero `flush_interval` makes the reporter run a single cycle and return.
    pub fn new(measurement: &str, flush_interval: Duration) -> Self {
        InfluxdbReporterConfig {
            measurement: Arc::from(measurement),
            tags: Arc::new(TagMap::default()),
            flush_interval,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            precision: TimestampPrecision::Seconds,
        }
    }

    pub fn set_tags(&mut self, tags: TagMap) {
        self.tags = Arc::new(tags);
    }

    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }

    pub fn set_precision(&mut self, precision: TimestampPrecision) {
        self.precision = precision;
    }

    #[inline]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    #[inline]
    pub fn tags(&self) -> &TagMap {
        &self.tags
    }

    #[inline]
    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    #[inline]
    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    #[inline]
    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    #[inline]
    pub fn is_single_shot(&self) -> bool {
        self.flush_interval.is_zero()
    }

    #[cfg(feature = "yaml")]
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!(
                "yaml value type for 'influxdb reporter config' should be 'map'"
            ));
        };

        let mut measurement: Option<String> = None;
        let mut flush_interval: Option<Duration> = None;
        let mut tags = TagMap::default();
        let mut write_timeout = DEFAULT_WRITE_TIMEOUT;
        let mut precision = TimestampPrecision::Seconds;

        crate::yaml::foreach_kv(map, |k, v| {
            match crate::yaml::normalize_key(k).as_str() {
                "measurement" => {
                    measurement = Some(crate::yaml::as_string(v)?);
                }
                "tags" => {
                    tags = TagMap::parse_yaml(v).context(format!("invalid tags value for key {k}"))?;
                }
                "flush_interval" | "emit_interval" => {
                    flush_interval = Some(
                        crate::yaml::as_interval(v)
                            .context(format!("invalid humanize duration value for key {k}"))?,
                    );
                }
                "write_timeout" => {
                    write_timeout = crate::yaml::as_duration(v)
                        .context(format!("invalid humanize duration value for key {k}"))?;
                }
                "precision" => {
                    precision = TimestampPrecision::parse_yaml(v)
                        .context(format!("invalid timestamp precision value for key {k}"))?;
                }
                _ => return Err(anyhow!("invalid key {k}")),
            }
            Ok(())
        })?;

        let Some(measurement) = measurement else {
            return Err(anyhow!("measurement is not set"));
        };
        let Some(flush_interval) = flush_interval else {
            return Err(anyhow!("flush interval is not set"));
        };
        if write_timeout.is_zero() {
            return Err(anyhow!("write timeout should not be zero"));
        }

        let mut config = InfluxdbReporterConfig::new(&measurement, flush_interval);
        config.set_tags(tags);
        config.set_write_timeout(write_timeout);
        config.set_precision(precision);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new() {
        let config = InfluxdbReporterConfig::new("app", Duration::from_secs(10));
        assert_eq!(config.measurement(), "app");
        assert!(config.tags().is_empty());
        assert_eq!(config.write_timeout(), DEFAULT_WRITE_TIMEOUT);
        assert_eq!(config.precision(), TimestampPrecision::Seconds);
        assert!(!config.is_single_shot());

        let config = InfluxdbReporterConfig::new("app", Duration::ZERO);
        assert!(config.is_single_shot());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn parse_yaml_ok() {
        let v = crate::yaml::load_doc(
            r#"
                measurement: go.metrics
                flush-interval: 15s
                write_timeout: 5s
                tags:
                  host: web-1
                  region: eu
            "#,
        );
        let config = InfluxdbReporterConfig::parse_yaml(&v).unwrap();
        assert_eq!(config.measurement(), "go.metrics");
        assert_eq!(config.flush_interval(), Duration::from_secs(15));
        assert_eq!(config.write_timeout(), Duration::from_secs(5));
        assert_eq!(config.tags().get("region"), Some("eu"));
        assert_eq!(config.precision(), TimestampPrecision::Seconds);

        let v = crate::yaml::load_doc(
            r#"
                measurement: m
                emit_interval: -1
            "#,
        );
        let config = InfluxdbReporterConfig::parse_yaml(&v).unwrap();
        assert!(config.is_single_shot());
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn parse_yaml_err() {
        let v = crate::yaml::load_doc("flush_interval: 10s");
        assert!(InfluxdbReporterConfig::parse_yaml(&v).is_err());

        let v = crate::yaml::load_doc("measurement: m");
        assert!(InfluxdbReporterConfig::parse_yaml(&v).is_err());

        let v = crate::yaml::load_doc(
            r#"
                measurement: m
                flush_interval: 10s
                write_timeout: 0
            "#,
        );
        assert!(InfluxdbReporterConfig::parse_yaml(&v).is_err());

        let v = crate::yaml::load_doc(
            r#"
                measurement: m
                flush_interval: 10s
                tags: [a, b]
            "#,
        );
        assert!(InfluxdbReporterConfig::parse_yaml(&v).is_err());

        let v = crate::yaml::load_doc(
            r#"
                measurement: m
                flush_interval: 10s
                retry: 3
            "#,
        );
        assert!(InfluxdbReporterConfig::parse_yaml(&v).is_err());

        assert!(InfluxdbReporterConfig::parse_yaml(&Yaml::Null).is_err());
    }
}
