/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::thread::JoinHandle;

use log::warn;
use tokio::sync::oneshot;
use tokio::task;

/// Control a reporter running as a tokio task.
///
/// Dropping the handle also stops the reporter.
pub struct ReporterHandle {
    quit_sender: oneshot::Sender<()>,
    join_handle: task::JoinHandle<()>,
}

impl ReporterHandle {
    pub(super) fn new(quit_sender: oneshot::Sender<()>, join_handle: task::JoinHandle<()>) -> Self {
        ReporterHandle {
            quit_sender,
            join_handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Ask the reporter to quit and wait for the running cycle to finish.
    pub async fn quit(self) {
        let _ = self.quit_sender.send(());
        if let Err(e) = self.join_handle.await {
            warn!("influxdb reporter task failed: {e}");
        }
    }
}

/// Control a reporter running on its own thread.
pub struct ReporterThreadHandle {
    quit_sender: oneshot::Sender<()>,
    join_handle: JoinHandle<()>,
}

impl ReporterThreadHandle {
    pub(super) fn new(quit_sender: oneshot::Sender<()>, join_handle: JoinHandle<()>) -> Self {
        ReporterThreadHandle {
            quit_sender,
            join_handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    /// Ask the reporter to quit and join the thread.
    ///
    /// This blocks the calling thread, don't call it inside an async context.
    pub fn quit(self) {
        let _ = self.quit_sender.send(());
        if self.join_handle.join().is_err() {
            warn!("influxdb reporter thread panicked");
        }
    }
}
