/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::anyhow;
#[cfg(feature = "yaml")]
use yaml_rust::Yaml;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
    V3,
}

impl ApiVersion {
    #[cfg(feature = "yaml")]
    pub(super) fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::String(s) => ApiVersion::from_str(s),
            Yaml::Integer(i) => match i {
                1 => Ok(ApiVersion::V1),
                2 => Ok(ApiVersion::V2),
                3 => Ok(ApiVersion::V3),
                _ => Err(anyhow!("unsupported api version {i}")),
            },
            _ => Err(anyhow!(
                "yaml value type for api version should be 'string' or 'integer'"
            )),
        }
    }
}

impl FromStr for ApiVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "v1" => Ok(ApiVersion::V1),
            "2" | "v2" => Ok(ApiVersion::V2),
            "3" | "v3" => Ok(ApiVersion::V3),
            _ => Err(anyhow!("unsupported api version {s}")),
        }
    }
}
