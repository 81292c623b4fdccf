/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use crate::point::DataPoint;
use crate::precision::TimestampPrecision;
use crate::protocol;

/// Points to be sent in one write call.
#[derive(Clone, Debug, Default)]
pub struct BatchPoints {
    precision: TimestampPrecision,
    points: Vec<DataPoint>,
}

impl BatchPoints {
    pub fn new(precision: TimestampPrecision) -> Self {
        BatchPoints {
            precision,
            points: Vec::new(),
        }
    }

    #[inline]
    pub fn precision(&self) -> TimestampPrecision {
        self.precision
    }

    pub fn add_point(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    #[inline]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append all points as line protocol to `buf`, returning the number of lines.
    pub fn encode_line_protocol(&self, buf: &mut Vec<u8>) -> usize {
        for point in &self.points {
            protocol::write_point(buf, point, self.precision);
        }
        self.points.len()
    }
}
