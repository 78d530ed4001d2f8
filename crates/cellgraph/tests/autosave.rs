//! Tests for debounced snapshot persistence

use cellgraph::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

/// Memory store that counts writes and can be told to fail
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    writer: Mutex<Option<ThreadId>>,
    fail: bool,
}

impl CountingStore {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Thread that performed the last write
    fn writer(&self) -> Option<ThreadId> {
        *self.writer.lock().unwrap()
    }

    fn stored(&self, key: &str) -> Option<PersistedState> {
        let payload = self.inner.load(key).unwrap()?;
        Some(PersistedState::from_json(&payload).unwrap())
    }
}

impl SnapshotStore for CountingStore {
    fn load(&self, key: &str) -> std::result::Result<Option<String>, PersistError> {
        self.inner.load(key)
    }

    fn save(&self, key: &str, payload: &str) -> std::result::Result<(), PersistError> {
        if self.fail {
            return Err(PersistError::storage("disk full"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.writer.lock().unwrap() = Some(thread::current().id());
        self.inner.save(key, payload)
    }
}

fn a1(state: &PersistedState) -> String {
    let address = CellAddress::parse("A1").unwrap();
    state.cells[&address].display.clone()
}

/// A burst of edits produces one write holding the last snapshot
#[tokio::test(start_paused = true)]
async fn test_superseded_writes_are_discarded() {
    let store = Arc::new(CountingStore::default());
    let mut saver = AutoSaver::new(store.clone(), AutosaveOptions::default());
    let mut workbook = Workbook::new();

    for input in ["1", "2", "3"] {
        workbook.edit("A1", input).unwrap();
        saver.schedule(workbook.snapshot());
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    assert_eq!(store.writes(), 0);
    assert!(saver.is_pending());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(store.writes(), 1);
    assert!(!saver.is_pending());

    let stored = store.stored(saver.key()).unwrap();
    assert_eq!(a1(&stored), "3");
}

/// Separate bursts are written separately
#[tokio::test(start_paused = true)]
async fn test_quiet_period_between_bursts() {
    let store = Arc::new(CountingStore::default());
    let options = AutosaveOptions::for_sheet("2").with_delay(Duration::from_millis(50));
    let mut saver = AutoSaver::new(store.clone(), options);
    let mut workbook = Workbook::new();

    workbook.edit("A1", "first").unwrap();
    saver.schedule(workbook.snapshot());
    tokio::time::sleep(Duration::from_millis(100)).await;

    workbook.edit("A1", "second").unwrap();
    saver.schedule(workbook.snapshot());
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(store.writes(), 2);
    assert_eq!(a1(&store.stored("sheet-data-2").unwrap()), "second");
}

/// Flushing writes at once and cancels the pending write
#[tokio::test(start_paused = true)]
async fn test_flush() {
    let store = Arc::new(CountingStore::default());
    let mut saver = AutoSaver::new(store.clone(), AutosaveOptions::default());
    let mut workbook = Workbook::new();

    assert!(!saver.flush().unwrap());

    workbook.edit("A1", "42").unwrap();
    saver.schedule(workbook.snapshot());
    assert!(saver.flush().unwrap());
    assert_eq!(store.writes(), 1);
    assert!(!saver.is_pending());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(store.writes(), 1);
    assert_eq!(a1(&store.stored("sheet-data-1").unwrap()), "42");
}

/// Store failures are logged by the background write and returned by flush
#[tokio::test(start_paused = true)]
async fn test_store_failure() {
    let store = Arc::new(CountingStore::failing());
    let mut saver = AutoSaver::new(store.clone(), AutosaveOptions::default());

    saver.schedule(Workbook::new().snapshot());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!saver.is_pending());

    saver.schedule(Workbook::new().snapshot());
    assert!(matches!(saver.flush(), Err(PersistError::Storage(_))));
    assert_eq!(store.writes(), 0);
}

/// Background writes happen on the blocking pool, flushes on the caller
#[tokio::test(start_paused = true)]
async fn test_background_write_leaves_runtime_thread() {
    let store = Arc::new(CountingStore::default());
    let mut saver = AutoSaver::new(store.clone(), AutosaveOptions::default());
    let mut workbook = Workbook::new();

    workbook.edit("A1", "1").unwrap();
    saver.schedule(workbook.snapshot());
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(store.writes(), 1);
    assert!(!saver.is_pending());
    assert_ne!(store.writer(), Some(thread::current().id()));

    workbook.edit("A1", "2").unwrap();
    saver.schedule(workbook.snapshot());
    assert!(saver.flush().unwrap());
    assert_eq!(store.writer(), Some(thread::current().id()));
}
