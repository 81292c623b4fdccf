/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod metric;
pub use metric::{Counter, FloatGauge, Gauge, Histogram, Metric, MetricKind};

mod registry;
pub use registry::{MetricsRegistry, Registry, RegistryError};

mod precision;
pub use precision::TimestampPrecision;

mod tag;
pub use tag::{DisplayInfluxdbTags, TagMap};

mod point;
pub use point::{DataPoint, FieldValue, MAX_SERIES_KEY_LENGTH, PointError};

mod batch;
pub use batch::BatchPoints;

mod protocol;

pub mod writer;
pub use writer::PointsWriter;

mod reporter;
pub use reporter::{
    FillStats, InfluxdbReporter, InfluxdbReporterConfig, ReporterHandle, ReporterThreadHandle,
    fill_batch, produce,
};

#[cfg(feature = "yaml")]
mod yaml;
