/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::future::Future;

use crate::batch::BatchPoints;
use crate::precision::TimestampPrecision;

mod console;
pub use console::ConsolePointsWriter;

mod memory;
pub use memory::MemoryPointsWriter;

mod http;
pub use http::{ApiVersion, HttpPointsWriter, HttpResponseError, HttpWriterConfig};

/// The write side of a time-series store.
pub trait PointsWriter: Send {
    /// Create an empty batch to be filled by one reporting cycle.
    fn new_batch(&self, precision: TimestampPrecision) -> anyhow::Result<BatchPoints> {
        Ok(BatchPoints::new(precision))
    }

    /// Send the batch to the store. Called once per cycle, even for an empty batch.
    fn write(&mut self, batch: &BatchPoints) -> impl Future<Output = anyhow::Result<()>> + Send;
}
