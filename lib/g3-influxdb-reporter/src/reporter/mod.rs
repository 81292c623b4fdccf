/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior};

use crate::registry::MetricsRegistry;
use crate::writer::PointsWriter;

mod config;
pub use config::InfluxdbReporterConfig;

mod builder;
pub use builder::{FillStats, fill_batch, produce};

mod handle;
pub use handle::{ReporterHandle, ReporterThreadHandle};

/// Periodically write all metrics of a registry to InfluxDB.
///
/// Cycles never overlap. A slow write delays the next tick instead.
pub struct InfluxdbReporter<R: MetricsRegistry + ?Sized, W: PointsWriter> {
    config: InfluxdbReporterConfig,
    registry: Arc<R>,
    writer: W,
}

impl<R, W> InfluxdbReporter<R, W>
where
    R: MetricsRegistry + ?Sized,
    W: PointsWriter,
{
    pub fn new(config: InfluxdbReporterConfig, registry: Arc<R>, writer: W) -> Self {
        InfluxdbReporter {
            config,
            registry,
            writer,
        }
    }

    #[inline]
    pub fn config(&self) -> &InfluxdbReporterConfig {
        &self.config
    }

    /// Run a single reporting cycle.
    ///
    /// Failures are logged and never returned.
    pub async fn report_once(&mut self) {
        let measurement = &self.config.measurement;
        let mut batch = match self.writer.new_batch(self.config.precision) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("influxdb reporter {measurement}: failed to create batch: {e:?}");
                return;
            }
        };

        let time = Utc::now();
        let start = Instant::now();
        let stats = fill_batch(
            &*self.registry,
            measurement,
            &self.config.tags,
            time,
            &mut batch,
        );

        let write_timeout = self.config.write_timeout;
        let r = tokio::time::timeout(write_timeout, self.writer.write(&batch))
            .await
            .unwrap_or_else(|_| Err(anyhow!("timed out after {write_timeout:?}")));
        match r {
            Ok(_) => debug!(
                "influxdb reporter {measurement}: wrote {} points ({} unsupported, {} invalid) in {:?}",
                stats.added,
                stats.unsupported,
                stats.invalid,
                start.elapsed()
            ),
            Err(e) => warn!(
                "influxdb reporter {measurement}: failed to write {} points: {e:?}",
                stats.added
            ),
        }
    }

    /// Run a cycle, giving up on it if `quit` fires first.
    ///
    /// Returns false if the cycle was interrupted.
    async fn report_unless_quit(&mut self, quit: &mut oneshot::Receiver<()>) -> bool {
        tokio::select! {
            biased;

            _ = self.report_once() => true,
            _ = quit => false,
        }
    }

    /// Report immediately, then on every flush interval tick until `quit` fires.
    ///
    /// With a zero flush interval only one cycle is run. Dropping the sender side
    /// of `quit` has the same effect as sending to it. A cycle still in progress
    /// when `quit` fires is dropped, so a hanging write never delays shutdown.
    pub async fn run(mut self, mut quit: oneshot::Receiver<()>) {
        let interval = self.config.flush_interval;
        if interval.is_zero() {
            self.report_unless_quit(&mut quit).await;
            return;
        }

        info!(
            "influxdb reporter {} started with interval {interval:?}",
            self.config.measurement
        );
        if self.report_unless_quit(&mut quit).await {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;

                    _ = &mut quit => break,
                    _ = ticker.tick() => {
                        if !self.report_unless_quit(&mut quit).await {
                            break;
                        }
                    }
                }
            }
        }

        info!("influxdb reporter {} quit", self.config.measurement);
    }
}

impl<R, W> InfluxdbReporter<R, W>
where
    R: MetricsRegistry + ?Sized + 'static,
    W: PointsWriter + 'static,
{
    /// Run the reporter as a task on the current tokio runtime.
    pub fn spawn(self) -> ReporterHandle {
        let (quit_sender, quit_receiver) = oneshot::channel();
        let join_handle = tokio::spawn(self.run(quit_receiver));
        ReporterHandle::new(quit_sender, join_handle)
    }

    /// Run the reporter on a dedicated thread with its own runtime.
    pub fn spawn_working_thread(self) -> anyhow::Result<ReporterThreadHandle> {
        let (quit_sender, quit_receiver) = oneshot::channel();
        let handle = std::thread::Builder::new()
            .name("influxdb-reporter".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        warn!("failed to create influxdb reporter runtime: {e:?}");
                        return;
                    }
                };
                rt.block_on(self.run(quit_receiver));
            })
            .map_err(|e| anyhow!("failed to spawn thread: {e:?}"))?;
        Ok(ReporterThreadHandle::new(quit_sender, handle))
    }
}
