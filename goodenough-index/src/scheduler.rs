//! Debounced incremental updates.
//!
//!     [`Debouncer`] is a plain state machine, `Idle` or `Pending(batch, deadline)`. Every
//!     arrival merges into the batch and pushes the deadline out by one window; once the
//!     deadline passes the batch is handed over and the machine returns to `Idle`.
//!
//!     [`UpdateScheduler`] drives the machine from a tokio task: it sleeps until the current
//!     deadline, wakes early whenever a new arrival moves it, and passes ripe batches to a
//!     [`BatchSink`]. Applies are serialized, so a batch flushed on demand can never overtake
//!     one the timer already took.

use crate::files::FileEntry;
use async_trait::async_trait;
use lsp_types::Url;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// File contents and deletions accumulated during one quiet window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    files: BTreeMap<Url, FileEntry>,
    deleted: BTreeSet<Url>,
}

impl UpdateBatch {
    pub fn new(files: Vec<FileEntry>, deleted: Vec<Url>) -> Self {
        let mut batch = Self::default();
        batch.merge(files, deleted);
        batch
    }

    /// Later arrivals win: a file replaces an earlier deletion of the same uri and vice versa.
    pub fn merge(&mut self, files: Vec<FileEntry>, deleted: Vec<Url>) {
        for file in files {
            self.deleted.remove(&file.uri);
            self.files.insert(file.uri.clone(), file);
        }
        for uri in deleted {
            self.files.remove(&uri);
            self.deleted.insert(uri);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.deleted.is_empty()
    }

    pub fn file(&self, uri: &Url) -> Option<&FileEntry> {
        self.files.get(uri)
    }

    pub fn is_deleted(&self, uri: &Url) -> bool {
        self.deleted.contains(uri)
    }

    pub fn into_parts(self) -> (Vec<FileEntry>, Vec<Url>) {
        (
            self.files.into_values().collect(),
            self.deleted.into_iter().collect(),
        )
    }
}

#[derive(Debug, Default)]
enum DebounceState {
    #[default]
    Idle,
    Pending {
        batch: UpdateBatch,
        deadline: Instant,
    },
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    /// Merge an arrival and reset the deadline. Returns the new deadline.
    pub fn arrive(&mut self, files: Vec<FileEntry>, deleted: Vec<Url>, now: Instant) -> Instant {
        let deadline = now + self.window;
        let mut batch = match std::mem::take(&mut self.state) {
            DebounceState::Idle => UpdateBatch::default(),
            DebounceState::Pending { batch, .. } => batch,
        };
        batch.merge(files, deleted);
        self.state = DebounceState::Pending { batch, deadline };
        deadline
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { deadline, .. } => Some(*deadline),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DebounceState::Idle)
    }

    /// Hand over the batch if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<UpdateBatch> {
        match self.deadline() {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// Hand over whatever is pending, ignoring the deadline.
    pub fn flush(&mut self) -> Option<UpdateBatch> {
        match std::mem::take(&mut self.state) {
            DebounceState::Idle => None,
            DebounceState::Pending { batch, .. } => Some(batch),
        }
    }
}

/// Receiver of flushed batches.
#[async_trait]
pub trait BatchSink: Send + Sync + 'static {
    async fn apply(&self, batch: UpdateBatch);
}

pub struct UpdateScheduler {
    debouncer: Arc<Mutex<Debouncer>>,
    apply_lock: Arc<Mutex<()>>,
    wake: Arc<Notify>,
    sink: Arc<dyn BatchSink>,
    worker: JoinHandle<()>,
}

impl UpdateScheduler {
    /// Start the timer task. Must be called from within a tokio runtime.
    pub fn spawn(window: Duration, sink: Arc<dyn BatchSink>) -> Self {
        let debouncer = Arc::new(Mutex::new(Debouncer::new(window)));
        let apply_lock = Arc::new(Mutex::new(()));
        let wake = Arc::new(Notify::new());
        let worker = tokio::spawn(run_timer(
            Arc::clone(&debouncer),
            Arc::clone(&apply_lock),
            Arc::clone(&wake),
            Arc::clone(&sink),
        ));
        Self {
            debouncer,
            apply_lock,
            wake,
            sink,
            worker,
        }
    }

    pub async fn schedule(&self, files: Vec<FileEntry>, deleted: Vec<Url>) {
        if files.is_empty() && deleted.is_empty() {
            return;
        }
        self.debouncer
            .lock()
            .await
            .arrive(files, deleted, Instant::now());
        self.wake.notify_one();
    }

    /// Apply the pending batch now. Returns whether there was one.
    pub async fn flush_now(&self) -> bool {
        let _applying = self.apply_lock.lock().await;
        let pending = self.debouncer.lock().await.flush();
        self.wake.notify_one();
        match pending {
            Some(batch) => {
                self.sink.apply(batch).await;
                true
            }
            None => false,
        }
    }

    /// Remove the pending batch so a caller can fold it into its own operation.
    ///
    /// The returned guard keeps timer flushes out until it is dropped.
    pub async fn take_pending(&self) -> (Option<UpdateBatch>, tokio::sync::MutexGuard<'_, ()>) {
        let guard = self.apply_lock.lock().await;
        let pending = self.debouncer.lock().await.flush();
        self.wake.notify_one();
        (pending, guard)
    }

    pub async fn has_pending(&self) -> bool {
        !self.debouncer.lock().await.is_idle()
    }

    /// Flush anything pending and stop the timer task.
    pub async fn shutdown(&self) {
        self.flush_now().await;
        self.worker.abort();
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_timer(
    debouncer: Arc<Mutex<Debouncer>>,
    apply_lock: Arc<Mutex<()>>,
    wake: Arc<Notify>,
    sink: Arc<dyn BatchSink>,
) {
    loop {
        let deadline = debouncer.lock().await.deadline();
        let Some(deadline) = deadline else {
            wake.notified().await;
            continue;
        };
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                let _applying = apply_lock.lock().await;
                let ripe = debouncer.lock().await.poll(Instant::now());
                if let Some(batch) = ripe {
                    sink.apply(batch).await;
                }
            }
            _ = wake.notified() => {}
        }
    }
}
