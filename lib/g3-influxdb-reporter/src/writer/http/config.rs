/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "yaml")]
use anyhow::Context;
use anyhow::anyhow;
use http::HeaderValue;
use http::uri::PathAndQuery;
#[cfg(feature = "yaml")]
use yaml_rust::Yaml;

use super::ApiVersion;
use crate::precision::TimestampPrecision;

const DEFAULT_PORT: u16 = 8086;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpWriterConfig {
    pub(super) host: String,
    pub(super) port: u16,
    version: ApiVersion,
    database: String,
    pub(super) precision: TimestampPrecision,
    api_token: Option<String>,
    v3_no_sync: bool,
    pub(super) connect_timeout: Duration,
    pub(super) rsp_header_max_size: usize,
    pub(super) rsp_body_max_size: usize,
}

impl Default for HttpWriterConfig {
    fn default() -> Self {
        HttpWriterConfig {
            host: String::new(),
            port: DEFAULT_PORT,
            version: ApiVersion::default(),
            database: String::new(),
            precision: TimestampPrecision::Seconds,
            api_token: None,
            v3_no_sync: false,
            connect_timeout: Duration::from_secs(10),
            rsp_header_max_size: 8192,
            rsp_body_max_size: 64 * 1024,
        }
    }
}

impl HttpWriterConfig {
    pub fn new(host: &str, port: u16, database: &str) -> Self {
        HttpWriterConfig {
            host: host.to_string(),
            port,
            database: database.to_string(),
            ..Default::default()
        }
    }

    pub fn set_api_version(&mut self, version: ApiVersion) {
        self.version = version;
    }

    pub fn set_precision(&mut self, precision: TimestampPrecision) {
        self.precision = precision;
    }

    pub fn set_api_token(&mut self, token: &str) {
        self.api_token = Some(token.to_string());
    }

    pub fn set_v3_no_sync(&mut self, no_sync: bool) {
        self.v3_no_sync = no_sync;
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    #[inline]
    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    pub(super) fn peer(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub(crate) fn build_api_path(&self) -> anyhow::Result<PathAndQuery> {
        let path = match self.version {
            ApiVersion::V1 => format!(
                "/write?db={}&precision={}",
                self.database,
                self.precision.v2_query_value()
            ),
            ApiVersion::V2 => format!(
                "/api/v2/write?bucket={}&precision={}",
                self.database,
                self.precision.v2_query_value()
            ),
            ApiVersion::V3 => {
                let mut path = format!(
                    "/api/v3/write_lp?db={}&precision={}",
                    self.database,
                    self.precision.v3_query_value()
                );
                if self.v3_no_sync {
                    path.push_str("&no_sync=true");
                }
                path
            }
        };
        PathAndQuery::from_str(&path).map_err(|e| anyhow!("invalid influxdb api path {path}: {e}"))
    }

    pub(crate) fn build_auth_header(&self) -> anyhow::Result<Option<HeaderValue>> {
        let Some(token) = &self.api_token else {
            return Ok(None);
        };
        let value = match self.version {
            ApiVersion::V1 | ApiVersion::V2 => format!("Token {token}"),
            ApiVersion::V3 => format!("Bearer {token}"),
        };
        let mut value =
            HeaderValue::from_str(&value).map_err(|e| anyhow!("invalid api token: {e}"))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            return Err(anyhow!("server host is not set"));
        }
        if self.database.is_empty() {
            return Err(anyhow!("database is not set"));
        }
        // the name goes into the query string as is
        if let Some(c) = self.database.chars().find(|c| {
            matches!(c, '&' | '#' | '?' | '%' | '+' | '=') || c.is_whitespace() || c.is_control()
        }) {
            return Err(anyhow!(
                "invalid char {c:?} in database name {}",
                self.database
            ));
        }
        Ok(())
    }

    #[cfg(feature = "yaml")]
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!(
                "yaml value type for 'influxdb http writer config' should be 'map'"
            ));
        };

        let mut config = HttpWriterConfig::default();
        crate::yaml::foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
        config.check()?;
        Ok(config)
    }

    #[cfg(feature = "yaml")]
    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match crate::yaml::normalize_key(k).as_str() {
            "host" | "server" => {
                self.host = crate::yaml::as_string(v)?;
            }
            "port" => {
                self.port = crate::yaml::as_u16(v)?;
            }
            "api_version" | "version" => {
                self.version = ApiVersion::parse_yaml(v)
                    .context(format!("invalid influxdb api version value for key {k}"))?;
            }
            "database" | "bucket" | "db" => {
                self.database = crate::yaml::as_string(v)?;
            }
            "precision" => {
                self.precision = TimestampPrecision::parse_yaml(v)
                    .context(format!("invalid timestamp precision value for key {k}"))?;
            }
            "api_token" | "token" => {
                self.api_token = Some(crate::yaml::as_string(v)?);
            }
            "v3_no_sync" => {
                self.v3_no_sync = crate::yaml::as_bool(v)?;
            }
            "connect_timeout" => {
                self.connect_timeout = crate::yaml::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
            }
            "rsp_header_max_size" => {
                self.rsp_header_max_size = crate::yaml::as_usize(v)
                    .context(format!("invalid usize value for key {k}"))?;
            }
            "rsp_body_max_size" => {
                self.rsp_body_max_size = crate::yaml::as_usize(v)
                    .context(format!("invalid usize value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }
}
