//! # Drill-down Writer
//!
//! Durably records, for every populated cell of every dimension pair, the
//! record IDs that populated it — without holding one open file per cell for
//! the whole run (cell counts reach the tens of thousands).
//!
//! ## Concurrency shape
//! -----------------
//! One blocking worker per *row* dimension, fed by its own bounded channel.
//! The orchestrator is the sole producer; it blocks when a queue is full,
//! which caps the number of in-flight messages instead of letting a slow disk
//! hide behind unbounded buffering. Messages to one worker are handled FIFO;
//! there is no cross-worker ordering and none is needed, since worker `i`
//! owns every path under dimension `i`'s output namespace and no two workers
//! ever touch the same file.
//!
//! Each worker caps its open handles at `max_open_files / N` (rounded up).
//! On a miss at capacity the cache closes and evicts *everything* before
//! opening the new path: the working set of cell updates has no useful
//! locality to exploit, so a full reset is kept over per-entry LRU.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tracing::debug;

use crate::mpcgrid_errors::MpcGridError;

/// Bounded queue depth per worker: enough to smooth producer/consumer timing,
/// small enough that memory in flight stays constant.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// One membership event: append `record_id` to the file at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrilldownMessage {
    pub target: Utf8PathBuf,
    pub record_id: String,
}

/// Capped map of open append handles, reset wholesale on overflow.
struct HandleCache {
    capacity: usize,
    handles: HashMap<Utf8PathBuf, File>,
}

impl HandleCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            handles: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.handles.len()
    }

    /// Append one line to `target`, opening (and creating parents for) the
    /// file if it is not cached. Files are append-only within a run: eviction
    /// only closes handles, a re-opened path picks up where it left off.
    fn append(&mut self, target: &Utf8Path, record_id: &str) -> io::Result<()> {
        if self.handles.len() >= self.capacity && !self.handles.contains_key(target) {
            self.handles.clear();
        }
        let file = match self.handles.entry(target.to_owned()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let file = open_append(slot.key())?;
                slot.insert(file)
            }
        };
        writeln!(file, "{record_id}")
    }
}

fn open_append(target: &Utf8Path) -> io::Result<File> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(target)
}

/// Handle on the set of spawned drill-down workers.
pub struct DrilldownWriter {
    senders: Vec<mpsc::Sender<DrilldownMessage>>,
    workers: Vec<JoinHandle<Result<(), MpcGridError>>>,
}

impl DrilldownWriter {
    /// Launch one worker per row dimension.
    ///
    /// Arguments
    /// -----------------
    /// * `num_dimensions` – Number of workers, one per row dimension.
    /// * `max_open_files` – Process-wide handle budget, split evenly across
    ///   workers (each gets at least one slot).
    /// * `queue_capacity` – Bounded depth of each worker's message queue.
    pub fn spawn(num_dimensions: usize, max_open_files: usize, queue_capacity: usize) -> Self {
        let cache_capacity = max_open_files.div_ceil(num_dimensions).max(1);
        let mut senders = Vec::with_capacity(num_dimensions);
        let mut workers = Vec::with_capacity(num_dimensions);
        for dimension in 0..num_dimensions {
            let (sender, receiver) = mpsc::channel(queue_capacity);
            senders.push(sender);
            workers.push(task::spawn_blocking(move || {
                worker_loop(dimension, receiver, cache_capacity)
            }));
        }
        Self { senders, workers }
    }

    /// Enqueue one membership event for row dimension `dimension`, blocking
    /// while that worker's queue is full (backpressure).
    pub async fn send(
        &self,
        dimension: usize,
        message: DrilldownMessage,
    ) -> Result<(), MpcGridError> {
        self.senders[dimension]
            .send(message)
            .await
            .map_err(|_| MpcGridError::WorkerStopped(dimension))
    }

    /// Close every queue and wait for every worker to drain and exit.
    ///
    /// Workers finish everything already queued before releasing their
    /// handles; the run is not complete until all of them have returned. The
    /// first worker error (including the one that made a `send` fail) is
    /// surfaced here.
    pub async fn shutdown(mut self) -> Result<(), MpcGridError> {
        self.senders.clear();
        let mut result = Ok(());
        for worker in self.workers.drain(..) {
            let joined = worker
                .await
                .map_err(|e| MpcGridError::WorkerPanicked(e.to_string()))
                .and_then(|r| r);
            if result.is_ok() {
                result = joined;
            }
        }
        result
    }
}

fn worker_loop(
    dimension: usize,
    mut receiver: mpsc::Receiver<DrilldownMessage>,
    cache_capacity: usize,
) -> Result<(), MpcGridError> {
    let mut cache = HandleCache::new(cache_capacity);
    let mut appended: u64 = 0;
    while let Some(message) = receiver.blocking_recv() {
        cache.append(&message.target, &message.record_id)?;
        appended += 1;
    }
    debug!(dimension, appended, "drill-down worker drained");
    Ok(())
}
