/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use humanize_rs::ParseError;
use yaml_rust::{Yaml, yaml};

pub(crate) fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

pub(crate) fn foreach_kv<F>(map: &yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in map.iter() {
        let Yaml::String(key) = k else {
            return Err(anyhow!("key in hash should be string"));
        };
        f(key, v).context(format!("failed to parse value of key {key}"))?;
    }
    Ok(())
}

pub(crate) fn as_string(v: &Yaml) -> anyhow::Result<String> {
    match v {
        Yaml::String(s) => Ok(s.to_string()),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(s) => Ok(s.to_string()),
        _ => Err(anyhow!(
            "yaml value type for string should be 'string' / 'integer' / 'real'"
        )),
    }
}

pub(crate) fn as_bool(v: &Yaml) -> anyhow::Result<bool> {
    v.as_bool()
        .ok_or_else(|| anyhow!("yaml value type for bool should be 'boolean'"))
}

pub(crate) fn as_u16(v: &Yaml) -> anyhow::Result<u16> {
    let Yaml::Integer(i) = v else {
        return Err(anyhow!("yaml value type for u16 should be 'integer'"));
    };
    u16::try_from(*i).map_err(|_| anyhow!("out of range u16 value {i}"))
}

pub(crate) fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    let Yaml::Integer(i) = v else {
        return Err(anyhow!("yaml value type for usize should be 'integer'"));
    };
    usize::try_from(*i).map_err(|_| anyhow!("out of range usize value {i}"))
}

pub(crate) fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => match humanize_rs::duration::parse(value) {
            Ok(v) => Ok(v),
            Err(ParseError::MissingUnit) => {
                if let Ok(u) = u64::from_str(value) {
                    Ok(Duration::from_secs(u))
                } else if let Ok(f) = f64::from_str(value) {
                    Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
                } else {
                    Err(anyhow!("invalid duration string"))
                }
            }
            Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
        },
        Yaml::Integer(value) => u64::try_from(*value)
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("out of range duration value {value}")),
        Yaml::Real(s) => {
            let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 value: {e}"))?;
            Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
        }
        _ => Err(anyhow!(
            "yaml value type for humanize duration should be 'string' or 'integer' or 'real'"
        )),
    }
}

/// Like [`as_duration`], but non-positive numbers all mean zero.
pub(crate) fn as_interval(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::Integer(i) if *i <= 0 => Ok(Duration::ZERO),
        Yaml::Real(s) if f64::from_str(s).is_ok_and(|f| f <= 0.0) => Ok(Duration::ZERO),
        Yaml::String(s) if s.starts_with('-') => Ok(Duration::ZERO),
        _ => as_duration(v),
    }
}

#[cfg(test)]
pub(crate) fn load_doc(s: &str) -> Yaml {
    let mut docs = yaml_rust::YamlLoader::load_from_str(s).unwrap();
    docs.pop().unwrap()
}
