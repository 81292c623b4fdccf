/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "yaml")]
use anyhow::anyhow;
#[cfg(feature = "yaml")]
use yaml_rust::Yaml;

use crate::protocol;

/// Static tags attached to every point, kept in key order as InfluxDB prefers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagMap {
    inner: BTreeMap<String, String>,
}

impl TagMap {
    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.inner.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(|v| v.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.inner.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Escaped `k1=v1,k2=v2` form, as used in the line protocol series key.
    pub fn display_influxdb(&self) -> DisplayInfluxdbTags<'_> {
        DisplayInfluxdbTags(self)
    }

    /// Length in bytes of the escaped `,k=v` suffix this map adds to a series key.
    pub(crate) fn encoded_len(&self) -> usize {
        protocol::encoded_tags(self)
            .map(|(k, v)| 2 + protocol::escaped_key_len(k) + protocol::escaped_key_len(v))
            .sum()
    }

    #[cfg(feature = "yaml")]
    pub(crate) fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'tags' should be 'map'"));
        };
        let mut tags = TagMap::default();
        crate::yaml::foreach_kv(map, |k, v| {
            let value = crate::yaml::as_string(v)?;
            tags.insert(k, value);
            Ok(())
        })?;
        Ok(tags)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tags = TagMap::default();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}

pub struct DisplayInfluxdbTags<'a>(&'a TagMap);

impl fmt::Display for DisplayInfluxdbTags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        protocol::write_tags(&mut buf, self.0);
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}
