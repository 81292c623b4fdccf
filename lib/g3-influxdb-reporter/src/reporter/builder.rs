/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;

use crate::batch::BatchPoints;
use crate::metric::Metric;
use crate::point::{DataPoint, FieldValue};
use crate::precision::TimestampPrecision;
use crate::registry::MetricsRegistry;
use crate::tag::TagMap;

/// What happened to the metrics seen while filling one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillStats {
    pub added: usize,
    pub unsupported: usize,
    pub invalid: usize,
}

fn extract_value(metric: &Metric) -> Option<FieldValue> {
    match metric {
        Metric::Counter(c) => Some(FieldValue::Integer(c.count())),
        Metric::Gauge(g) => Some(FieldValue::Integer(g.value())),
        Metric::FloatGauge(g) => Some(FieldValue::Float(g.value())),
        Metric::Histogram(_) => None,
    }
}

/// Add one point per supported metric of `registry` to `batch`.
///
/// Each point holds a single field named after the metric, and every point gets
/// the same `time`. Unsupported metrics and invalid points are logged and skipped.
pub fn fill_batch<R>(
    registry: &R,
    measurement: &Arc<str>,
    tags: &Arc<TagMap>,
    time: DateTime<Utc>,
    batch: &mut BatchPoints,
) -> FillStats
where
    R: MetricsRegistry + ?Sized,
{
    let mut stats = FillStats::default();

    registry.for_each_metric(&mut |name, metric| {
        let Some(value) = extract_value(metric) else {
            warn!(
                "don't know how to process metric {name} of kind {}",
                metric.kind()
            );
            stats.unsupported += 1;
            return;
        };

        match DataPoint::with_field(measurement.clone(), tags.clone(), name, value, time) {
            Ok(point) => {
                batch.add_point(point);
                stats.added += 1;
            }
            Err(e) => {
                warn!("unable to build point for metric {name} with value {value}: {e}");
                stats.invalid += 1;
            }
        }
    });

    stats
}

/// Build a seconds precision batch from the current state of `registry`.
pub fn produce<R>(
    registry: &R,
    measurement: &Arc<str>,
    tags: &Arc<TagMap>,
    time: DateTime<Utc>,
) -> BatchPoints
where
    R: MetricsRegistry + ?Sized,
{
    let mut batch = BatchPoints::new(TimestampPrecision::Seconds);
    fill_batch(registry, measurement, tags, time, &mut batch);
    batch
}
