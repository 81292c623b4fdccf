/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::PointsWriter;
use crate::batch::BatchPoints;

struct MemoryStore {
    write_count: AtomicUsize,
    batches: Mutex<VecDeque<BatchPoints>>,
}

/// Keep the latest batches in memory.
///
/// Clones share the same store, so one clone can be handed to the reporter while
/// another one is used to inspect what has been written.
#[derive(Clone)]
pub struct MemoryPointsWriter {
    store_count: usize,
    store: Arc<MemoryStore>,
}

impl MemoryPointsWriter {
    pub fn new(store_count: usize) -> Self {
        MemoryPointsWriter {
            store_count,
            store: Arc::new(MemoryStore {
                write_count: AtomicUsize::new(0),
                batches: Mutex::new(VecDeque::with_capacity(store_count)),
            }),
        }
    }

    /// Number of write calls seen so far, including the ones already evicted.
    pub fn write_count(&self) -> usize {
        self.store.write_count.load(Ordering::Acquire)
    }

    /// Stored batches, the newest first.
    pub fn batches(&self) -> Vec<BatchPoints> {
        let queue = self.store.batches.lock().unwrap();
        queue.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<BatchPoints> {
        let queue = self.store.batches.lock().unwrap();
        queue.front().cloned()
    }
}

impl PointsWriter for MemoryPointsWriter {
    async fn write(&mut self, batch: &BatchPoints) -> anyhow::Result<()> {
        let mut queue = self.store.batches.lock().unwrap();
        queue.push_front(batch.clone());
        queue.truncate(self.store_count);
        drop(queue);
        self.store.write_count.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}
