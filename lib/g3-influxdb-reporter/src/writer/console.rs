/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::anyhow;
use tokio::io::AsyncWriteExt;

use super::PointsWriter;
use crate::batch::BatchPoints;

/// Print each batch as line protocol to stdout.
#[derive(Default)]
pub struct ConsolePointsWriter {
    buf: Vec<u8>,
}

impl PointsWriter for ConsolePointsWriter {
    async fn write(&mut self, batch: &BatchPoints) -> anyhow::Result<()> {
        self.buf.clear();
        batch.encode_line_protocol(&mut self.buf);

        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(&self.buf)
            .await
            .map_err(|e| anyhow!("failed to write to stdout: {e}"))?;
        stdout
            .flush()
            .await
            .map_err(|e| anyhow!("failed to flush stdout: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::point::{DataPoint, FieldValue};
    use crate::precision::TimestampPrecision;
    use crate::tag::TagMap;

    #[tokio::test]
    async fn write() {
        let mut batch = BatchPoints::new(TimestampPrecision::Seconds);
        let point = DataPoint::with_field(
            Arc::from("console"),
            Arc::new(TagMap::default()),
            "up",
            FieldValue::Integer(1),
            Utc::now(),
        )
        .unwrap();
        batch.add_point(point);

        let mut writer = ConsolePointsWriter::default();
        writer.write(&batch).await.unwrap();
        assert!(writer.buf.starts_with(b"console up=1i "));
    }
}
