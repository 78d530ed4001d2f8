//! Debounced persistence
//!
//! Every edit may schedule a save; only the last snapshot of a burst is written,
//! once the burst has been quiet for the configured delay.

use crate::error::PersistError;
use crate::options::AutosaveOptions;
use crate::persist::{PersistedState, SnapshotStore};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs a task once no new task has been scheduled for `delay`
///
/// Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// The quiet period
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, discarding whatever was scheduled before it
    pub fn schedule<F>(&mut self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_async(async move { task() });
    }

    /// Schedule a future, discarding whatever was scheduled before it
    pub fn schedule_async<Fut>(&mut self, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Drop the scheduled task if it has not run yet
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Check if a task is scheduled and not yet finished
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Writes workbook snapshots to a [`SnapshotStore`] after a quiet period
///
/// Background writes run on Tokio's blocking pool, so stores such as
/// [`FileStore`](crate::FileStore) may use synchronous I/O. [`AutoSaver::flush`]
/// writes on the calling thread.
///
/// # Example
/// ```rust
/// use cellgraph::{AutoSaver, AutosaveOptions, MemoryStore, SnapshotStore, Workbook};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = Arc::new(MemoryStore::new());
/// let mut saver = AutoSaver::new(store.clone(), AutosaveOptions::default());
///
/// let mut workbook = Workbook::new();
/// workbook.edit("A1", "5").unwrap();
/// saver.schedule(workbook.snapshot());
///
/// saver.flush().unwrap();
/// assert!(store.load("sheet-data-1").unwrap().is_some());
/// # }
/// ```
pub struct AutoSaver {
    store: Arc<dyn SnapshotStore>,
    key: String,
    debouncer: Debouncer,
    latest: Arc<Mutex<Option<PersistedState>>>,
}

impl AutoSaver {
    pub fn new(store: Arc<dyn SnapshotStore>, options: AutosaveOptions) -> Self {
        Self {
            store,
            key: options.key,
            debouncer: Debouncer::new(options.delay),
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Storage key snapshots are written under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the pending snapshot and restart the quiet period
    pub fn schedule(&mut self, snapshot: PersistedState) {
        match self.latest.lock() {
            Ok(mut latest) => *latest = Some(snapshot),
            Err(_) => {
                log::warn!("Autosave state poisoned; dropping snapshot for {}", self.key);
                return;
            }
        }

        let store = Arc::clone(&self.store);
        let latest = Arc::clone(&self.latest);
        let key = self.key.clone();

        self.debouncer.schedule_async(async move {
            // Stores may do blocking I/O; keep it off the runtime's workers
            let write_key = key.clone();
            let written = tokio::task::spawn_blocking(move || {
                write_latest(store.as_ref(), &write_key, &latest)
            })
            .await;

            match written {
                Ok(Ok(true)) => log::debug!("Autosaved {}", key),
                Ok(Ok(false)) => {}
                Ok(Err(e)) => log::warn!("Autosave of {} failed: {}", key, e),
                Err(e) => log::warn!("Autosave of {} did not complete: {}", key, e),
            }
        });
    }

    /// Write the pending snapshot now, if there is one
    ///
    /// Returns whether anything was written.
    pub fn flush(&mut self) -> Result<bool, PersistError> {
        self.debouncer.cancel();
        write_latest(self.store.as_ref(), &self.key, &self.latest)
    }

    /// Check if a write is waiting for its quiet period
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

fn write_latest(
    store: &dyn SnapshotStore,
    key: &str,
    latest: &Mutex<Option<PersistedState>>,
) -> Result<bool, PersistError> {
    let snapshot = latest
        .lock()
        .map_err(|_| PersistError::storage("autosave state poisoned"))?
        .take();

    match snapshot {
        Some(snapshot) => {
            store.save(key, &snapshot.to_json()?)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
