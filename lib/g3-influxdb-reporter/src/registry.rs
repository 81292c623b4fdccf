/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, RwLock};

use ahash::AHashMap;
use thiserror::Error;

use crate::metric::{Counter, FloatGauge, Gauge, Histogram, Metric, MetricKind};

/// Read only view of a set of named metrics.
pub trait MetricsRegistry: Send + Sync {
    /// Visit every metric currently registered. The visiting order is unspecified.
    fn for_each_metric(&self, f: &mut dyn FnMut(&str, &Metric));
}

impl<T: MetricsRegistry + ?Sized> MetricsRegistry for Arc<T> {
    fn for_each_metric(&self, f: &mut dyn FnMut(&str, &Metric)) {
        self.as_ref().for_each_metric(f)
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metric {0} is already registered")]
    Duplicate(String),
    #[error("metric {name} is registered as {registered}, not {requested}")]
    KindMismatch {
        name: String,
        registered: MetricKind,
        requested: MetricKind,
    },
}

#[derive(Default)]
pub struct Registry {
    inner: RwLock<AHashMap<String, Metric>>,
}

macro_rules! impl_get_or_register {
    ($fn_name:ident, $ty:ident) => {
        pub fn $fn_name(&self, name: &str) -> Result<Arc<$ty>, RegistryError> {
            let mut map = self.inner.write().unwrap();
            let m = map
                .entry(name.to_string())
                .or_insert_with(|| Metric::$ty(Arc::new($ty::new())))
                .clone();
            match m {
                Metric::$ty(v) => Ok(v),
                other => Err(RegistryError::KindMismatch {
                    name: name.to_string(),
                    registered: other.kind(),
                    requested: MetricKind::$ty,
                }),
            }
        }
    };
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register<M: Into<Metric>>(&self, name: &str, metric: M) -> Result<(), RegistryError> {
        let mut map = self.inner.write().unwrap();
        if map.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        map.insert(name.to_string(), metric.into());
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.inner.write().unwrap().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.inner.read().unwrap().get(name).cloned()
    }

    impl_get_or_register!(get_or_register_counter, Counter);
    impl_get_or_register!(get_or_register_gauge, Gauge);
    impl_get_or_register!(get_or_register_float_gauge, FloatGauge);
    impl_get_or_register!(get_or_register_histogram, Histogram);

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    fn snapshot(&self) -> Vec<(String, Metric)> {
        let map = self.inner.read().unwrap();
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl MetricsRegistry for Registry {
    fn for_each_metric(&self, f: &mut dyn FnMut(&str, &Metric)) {
        // don't hold the lock while the visitor runs
        for (name, metric) in self.snapshot() {
            f(&name, &metric);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        registry
            .register("requests", Arc::new(Counter::new()))
            .unwrap();
        let r = registry.register("requests", Arc::new(Gauge::new()));
        assert!(matches!(r, Err(RegistryError::Duplicate(_))));
        assert_eq!(registry.len(), 1);

        let m = registry.get("requests").unwrap();
        assert_eq!(m.kind(), MetricKind::Counter);

        assert!(registry.unregister("requests").is_some());
        assert!(registry.get("requests").is_none());
    }

    #[test]
    fn get_or_register() {
        let registry = Registry::new();
        let c1 = registry.get_or_register_counter("c").unwrap();
        c1.inc(2);
        let c2 = registry.get_or_register_counter("c").unwrap();
        assert_eq!(c2.count(), 2);

        let e = registry.get_or_register_gauge("c").unwrap_err();
        assert_eq!(e.to_string(), "metric c is registered as counter, not gauge");

        let g = registry.get_or_register_float_gauge("g").unwrap();
        g.update(0.5);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn for_each() {
        let registry = Registry::new();
        registry.get_or_register_counter("a").unwrap();
        registry.get_or_register_gauge("b").unwrap();
        registry.get_or_register_histogram("c").unwrap();

        let mut names = Vec::new();
        registry.for_each_metric(&mut |name, _| names.push(name.to_string()));
        names.sort();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
