/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Counter::default()
    }

    pub fn inc(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn dec(&self, n: i64) {
        self.count.fetch_sub(n, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.count.store(0, Ordering::Relaxed);
    }

    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Gauge::default()
    }

    pub fn update(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Gauge holding a `f64`, stored as raw bits.
#[derive(Debug, Default)]
pub struct FloatGauge {
    bits: AtomicU64,
}

impl FloatGauge {
    pub fn new() -> Self {
        FloatGauge::default()
    }

    pub fn update(&self, v: f64) {
        self.bits.store(v.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct HistogramSummary {
    count: u64,
    sum: i64,
    min: i64,
    max: i64,
}

/// Sample summary. Registries may hold it, but the reporter doesn't export it.
#[derive(Debug, Default)]
pub struct Histogram {
    inner: Mutex<HistogramSummary>,
}

impl Histogram {
    pub fn new() -> Self {
        Histogram::default()
    }

    pub fn update(&self, v: i64) {
        let mut s = self.inner.lock().unwrap();
        if s.count == 0 {
            s.min = v;
            s.max = v;
        } else {
            s.min = s.min.min(v);
            s.max = s.max.max(v);
        }
        s.count += 1;
        s.sum = s.sum.wrapping_add(v);
    }

    pub fn clear(&self) {
        *self.inner.lock().unwrap() = HistogramSummary::default();
    }

    pub fn count(&self) -> u64 {
        self.inner.lock().unwrap().count
    }

    pub fn sum(&self) -> i64 {
        self.inner.lock().unwrap().sum
    }

    pub fn min(&self) -> i64 {
        self.inner.lock().unwrap().min
    }

    pub fn max(&self) -> i64 {
        self.inner.lock().unwrap().max
    }

    pub fn mean(&self) -> f64 {
        let s = *self.inner.lock().unwrap();
        if s.count == 0 {
            0.0
        } else {
            s.sum as f64 / s.count as f64
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    FloatGauge,
    Histogram,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::FloatGauge => "float_gauge",
            MetricKind::Histogram => "histogram",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    FloatGauge(Arc<FloatGauge>),
    Histogram(Arc<Histogram>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::FloatGauge(_) => MetricKind::FloatGauge,
            Metric::Histogram(_) => MetricKind::Histogram,
        }
    }
}

impl From<Arc<Counter>> for Metric {
    fn from(value: Arc<Counter>) -> Self {
        Metric::Counter(value)
    }
}

impl From<Arc<Gauge>> for Metric {
    fn from(value: Arc<Gauge>) -> Self {
        Metric::Gauge(value)
    }
}

impl From<Arc<FloatGauge>> for Metric {
    fn from(value: Arc<FloatGauge>) -> Self {
        Metric::FloatGauge(value)
    }
}

impl From<Arc<Histogram>> for Metric {
    fn from(value: Arc<Histogram>) -> Self {
        Metric::Histogram(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter() {
        let c = Counter::new();
        c.inc(10);
        c.dec(3);
        assert_eq!(c.count(), 7);
        c.clear();
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn float_gauge() {
        let g = FloatGauge::new();
        assert_eq!(g.value(), 0.0);
        g.update(-1.25);
        assert_eq!(g.value(), -1.25);
    }

    #[test]
    fn histogram() {
        let h = Histogram::new();
        assert_eq!(h.mean(), 0.0);
        h.update(4);
        h.update(-2);
        h.update(10);
        assert_eq!(h.count(), 3);
        assert_eq!(h.sum(), 12);
        assert_eq!(h.min(), -2);
        assert_eq!(h.max(), 10);
        assert_eq!(h.mean(), 4.0);
    }

    #[test]
    fn kind() {
        let m = Metric::from(Arc::new(Gauge::new()));
        assert_eq!(m.kind(), MetricKind::Gauge);
        let m = Metric::from(Arc::new(Histogram::new()));
        assert_eq!(m.kind().to_string(), "histogram");
    }
}
